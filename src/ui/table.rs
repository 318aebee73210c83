use crate::adapter::CodeEntity;
use tabled::{Table, Tabled, settings::Style};

#[derive(Tabled)]
pub struct EntityRow {
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Lines")]
    pub lines: String,
    #[tabled(rename = "Methods")]
    pub methods: String,
}

impl From<&CodeEntity> for EntityRow {
    fn from(entity: &CodeEntity) -> Self {
        Self {
            kind: entity.kind.to_string(),
            name: entity.name.clone(),
            lines: format!("{}-{}", entity.start_line, entity.end_line),
            methods: entity.methods.join(", "),
        }
    }
}

pub fn entity_table(entities: &[CodeEntity]) -> String {
    if entities.is_empty() {
        return String::new();
    }

    let rows: Vec<EntityRow> = entities.iter().map(EntityRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

pub fn metrics_table(metrics: &[(&str, String)]) -> String {
    let rows: Vec<MetricRow> = metrics
        .iter()
        .map(|(metric, value)| MetricRow {
            metric: metric.to_string(),
            value: value.clone(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::EntityKind;

    #[test]
    fn test_entity_table_lists_methods() {
        let entity = CodeEntity {
            kind: EntityKind::Class,
            name: "Counter".to_string(),
            snippet: "class Counter: ...".to_string(),
            methods: vec!["incr".to_string(), "reset".to_string()],
            start_line: 4,
            end_line: 9,
        };

        let table = entity_table(&[entity]);
        assert!(table.contains("Counter"));
        assert!(table.contains("incr, reset"));
        assert!(table.contains("4-9"));
    }

    #[test]
    fn test_empty_entity_table() {
        assert!(entity_table(&[]).is_empty());
    }

    #[test]
    fn test_metrics_table() {
        let table = metrics_table(&[("Sessions", "2".to_string())]);
        assert!(table.contains("Sessions"));
        assert!(table.contains("Metric"));
    }
}
