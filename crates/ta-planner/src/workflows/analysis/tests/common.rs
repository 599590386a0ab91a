use std::collections::BTreeSet;
use std::sync::Arc;

use axum::body::to_bytes;
use axum::response::Response;
use serde_json::Value;

use crate::workflows::analysis::domain::{SchoolId, WeightingConfigDraft};
use crate::workflows::analysis::memory::{
    InMemoryDatasets, InMemoryResults, InMemoryWeightingConfigs,
};
use crate::workflows::analysis::repository::{
    DatasetStore, RepositoryError, ResultStore, WeightingConfigStore,
};
use crate::workflows::analysis::{
    analysis_router, AnalysisResult, NeedAnalysisService, ResultId, WeightingConfig,
    WeightingConfigId,
};
use crate::workflows::datasets::{
    DatasetKind, NormalizedDataset, StagedDatasets, StudentEnrolment, StudentKey,
    StudentNeedsProfile, TimetableSession,
};

pub(super) type MemoryService =
    NeedAnalysisService<InMemoryWeightingConfigs, InMemoryDatasets, InMemoryResults>;

pub(super) const SCHOOL: &str = "north-hill";

pub(super) const ENROLMENT_CSV: &str = "\
Name,Courses/classes
Amara Okafor,\"Maths: Year 7: 7E/Ma1, English: Year 7: 7E/En2\"
Ben Carter,\"Maths: Year 7: 7E/Ma1, Science: Year 7: 7E/Sc1\"
Chloe Davies,\"English: Year 7: 7E/En2, Science: Year 7: 7E/Sc1\"
Dev Patel,Maths: Year 7: 7E/Ma1
";

pub(super) const NEEDS_CSV: &str = "\
Name,Pupil Premium Recipient at any time this academic year?,SEN at any time this academic year?,SEN need(s),EAL at any time this academic year?,Read. Comp. Standardised Score,Spelling Standardised Score,BOXALL,Medical Information,Stage 1,Stage 2
Amara Okafor,Yes,Yes,\"Dyslexia; ADHD\",No,92,88,,,,
Ben Carter,No,No,,Yes,78,,,Asthma,Yes,
Chloe Davies,No,No,,No,,,,,,
";

pub(super) const TIMETABLE_CSV: &str = "\
Day,Time Slot,Course/Class,Staff,Room
Monday,09:00 - 10:00,Maths: 7E/Ma1,JDI,M1
Monday,13:00 - 14:00,English: 7E/En2,KLO,E4
Tuesday,09:00 - 10:00,Science: 7E/Sc1,PRT,S2
Tuesday,10:00 - 11:00,Maths: 7E/Ma1,JDI,M1
";

pub(super) fn school() -> SchoolId {
    SchoolId(SCHOOL.to_string())
}

pub(super) fn build_service() -> (MemoryService, Arc<InMemoryWeightingConfigs>) {
    let configs = Arc::new(InMemoryWeightingConfigs::default());
    let service = NeedAnalysisService::new(
        configs.clone(),
        Arc::new(InMemoryDatasets::default()),
        Arc::new(InMemoryResults::default()),
    );
    (service, configs)
}

/// Service with all three fixture datasets installed and a default config saved.
pub(super) fn loaded_service() -> (MemoryService, WeightingConfig) {
    let (service, _) = build_service();
    upload_fixtures(&service);
    let config = service
        .save_config(WeightingConfigDraft::default_for(school()))
        .expect("default config saved");
    (service, config)
}

pub(super) fn upload_fixtures(service: &MemoryService) {
    service
        .ingest(DatasetKind::StudentsClasses, ENROLMENT_CSV.as_bytes())
        .expect("enrolment accepted");
    service
        .ingest(DatasetKind::StudentsSen, NEEDS_CSV.as_bytes())
        .expect("needs accepted");
    service
        .ingest(DatasetKind::Timetable, TIMETABLE_CSV.as_bytes())
        .expect("timetable accepted");
}

pub(super) fn enrolment(name: &str, classes: &[&str]) -> StudentEnrolment {
    StudentEnrolment {
        key: StudentKey::new(name),
        name: name.to_string(),
        classes: classes.iter().map(|code| code.to_string()).collect(),
    }
}

pub(super) fn profile(name: &str) -> StudentNeedsProfile {
    StudentNeedsProfile::absent(StudentKey::new(name), name)
}

pub(super) fn sen_profile(name: &str, needs: &[&str]) -> StudentNeedsProfile {
    StudentNeedsProfile {
        sen_need_types: needs.iter().map(|need| need.to_string()).collect::<BTreeSet<_>>(),
        ..profile(name)
    }
}

pub(super) fn session(day: &str, time_slot: &str, class_code: &str) -> TimetableSession {
    TimetableSession {
        day: day.to_string(),
        time_slot: time_slot.to_string(),
        class_code: class_code.to_string(),
        course_label: format!("Course: {class_code}"),
        staff: "ABC".to_string(),
        room: "R1".to_string(),
    }
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    analysis_router(Arc::new(service))
}

pub(super) async fn read_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

pub(super) fn error_kind(body: &Value) -> &str {
    body["error"]["kind"].as_str().expect("error kind present")
}

/// Dataset store whose lock has been lost.
pub(super) struct UnavailableDatasets;

impl DatasetStore for UnavailableDatasets {
    fn install(&self, _dataset: NormalizedDataset) -> Result<u64, RepositoryError> {
        Err(RepositoryError::Unavailable("dataset volume offline".to_string()))
    }

    fn clear(&self) -> Result<u64, RepositoryError> {
        Err(RepositoryError::Unavailable("dataset volume offline".to_string()))
    }

    fn current(&self) -> Result<Arc<StagedDatasets>, RepositoryError> {
        Err(RepositoryError::Unavailable("dataset volume offline".to_string()))
    }
}

/// Dataset store that notes which thread last read the current snapshot.
#[derive(Default)]
pub(super) struct ThreadTrackingDatasets {
    inner: InMemoryDatasets,
    pub(super) reader: std::sync::Mutex<Option<std::thread::ThreadId>>,
}

impl DatasetStore for ThreadTrackingDatasets {
    fn install(&self, dataset: NormalizedDataset) -> Result<u64, RepositoryError> {
        self.inner.install(dataset)
    }

    fn clear(&self) -> Result<u64, RepositoryError> {
        self.inner.clear()
    }

    fn current(&self) -> Result<Arc<StagedDatasets>, RepositoryError> {
        if let Ok(mut reader) = self.reader.lock() {
            *reader = Some(std::thread::current().id());
        }
        self.inner.current()
    }
}

/// Result store that refuses writes, used to prove runs persist nothing on failure.
#[derive(Default)]
pub(super) struct ReadOnlyResults;

impl ResultStore for ReadOnlyResults {
    fn save(&self, _result: AnalysisResult) -> Result<ResultId, RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn get(&self, _id: &ResultId) -> Result<Option<AnalysisResult>, RepositoryError> {
        Ok(None)
    }

    fn latest(&self) -> Result<Option<(ResultId, AnalysisResult)>, RepositoryError> {
        Ok(None)
    }
}

pub(super) fn missing_config() -> WeightingConfigId {
    WeightingConfigId("cfg-404404".to_string())
}

pub(super) fn config_store_ids(store: &InMemoryWeightingConfigs) -> Vec<WeightingConfigId> {
    store
        .list(&school())
        .expect("configs listed")
        .into_iter()
        .map(|config| config.id)
        .collect()
}
