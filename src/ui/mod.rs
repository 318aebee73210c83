pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{dim, error, header, info, success, warn};
pub use table::{EntityRow, entity_table, metrics_table};
pub use theme::{Theme, theme};
