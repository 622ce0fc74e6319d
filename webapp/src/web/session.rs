use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use medviscore::telemetry::MetricsRecorder;
use serde::{Deserialize, Serialize};

/// Patient intake form fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientInfo {
    pub name: String,
    pub age: String,
    pub gender: String,
    pub village: String,
    pub district: String,
    pub state: String,
    pub phone: String,
    pub address: String,
    pub emergency_phone: String,
}

impl PatientInfo {
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let get = |key: &str| fields.get(key).cloned().unwrap_or_default();
        Self {
            name: get("patient_name"),
            age: get("age"),
            gender: get("gender"),
            village: get("village"),
            district: get("district"),
            state: get("state"),
            phone: get("phone"),
            address: get("address"),
            emergency_phone: get("emergency_phone"),
        }
    }
}

/// One completed analysis retained for the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub timestamp: String,
    pub patient: PatientInfo,
    pub source_name: String,
    pub report: String,
}

/// Session-scoped state injected into each handler. History is append-only
/// with a single writer per request cycle; nothing here outlives the
/// process.
pub struct SessionContext {
    history: RwLock<Vec<AnalysisRecord>>,
    pub metrics: Arc<MetricsRecorder>,
}

impl SessionContext {
    pub fn new(metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            history: RwLock::new(Vec::new()),
            metrics,
        }
    }

    pub fn append(&self, record: AnalysisRecord) -> usize {
        let mut history = self.history.write().unwrap();
        history.push(record);
        history.len() - 1
    }

    pub fn record(&self, index: usize) -> Option<AnalysisRecord> {
        self.history.read().unwrap().get(index).cloned()
    }

    /// Records in display order, most recent first, paired with their
    /// stable indices.
    pub fn recent(&self) -> Vec<(usize, AnalysisRecord)> {
        let history = self.history.read().unwrap();
        history
            .iter()
            .cloned()
            .enumerate()
            .rev()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.history.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> AnalysisRecord {
        AnalysisRecord {
            timestamp: "2026-08-07 10:00".into(),
            patient: PatientInfo {
                name: name.into(),
                ..PatientInfo::default()
            },
            source_name: "scan.jpg".into(),
            report: "report body".into(),
        }
    }

    #[test]
    fn history_appends_in_order_and_lists_recent_first() {
        let context = SessionContext::new(Arc::new(MetricsRecorder::new()));
        assert!(context.is_empty());
        let first = context.append(record("first"));
        let second = context.append(record("second"));
        assert_eq!((first, second), (0, 1));

        let recent = context.recent();
        assert_eq!(recent[0].1.patient.name, "second");
        assert_eq!(recent[1].1.patient.name, "first");
        assert_eq!(context.record(0).unwrap().patient.name, "first");
        assert!(context.record(5).is_none());
    }

    #[test]
    fn patient_info_reads_known_fields() {
        let mut fields = HashMap::new();
        fields.insert("patient_name".to_string(), "A. Devi".to_string());
        fields.insert("district".to_string(), "Salem".to_string());
        let patient = PatientInfo::from_fields(&fields);
        assert_eq!(patient.name, "A. Devi");
        assert_eq!(patient.district, "Salem");
        assert_eq!(patient.phone, "");
    }
}
