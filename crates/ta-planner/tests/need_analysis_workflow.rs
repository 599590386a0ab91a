use std::sync::Arc;

use ta_planner::workflows::analysis::{
    compute_report, AggregationPolicy, AnalysisError, InMemoryDatasets, InMemoryResults,
    InMemoryWeightingConfigs, NeedAnalysisService, NeedBand, NeedWeights, PriorityBand, SchoolId,
    WeightingConfigDraft,
};
use ta_planner::workflows::datasets::{DatasetImporter, DatasetKind, NormalizedDataset};

const ENROLMENT: &str = "\
Student Name,Classes
Jane Smith,\"Maths: Year 9: 9X/Ma1; History: Year 9: 9X/Hi2\"
Omar Haddad,Maths: Year 9: 9X/Ma1
Lucy Wong,\"Maths: Year 9: 9X/Ma1, Tutor: 9X/Tu\"
";

const NEEDS: &str = "\
Name,Pupil Premium,Looked After (In Care) Status,SEN,SEN Needs,EAL,Reading Score,Spelling Score,BOXALL,Neurodiversity and/or Sensory Impairment,Medical Information,Health Care Plan/Risk Assessment,Stage 1,Stage 2,Stage 3
Jane Smith,yes,Yes,yes,\"SEMH, SLCN, Dyslexia\",no,72,79,Completed,ADHD,Epilepsy,,x,x,x
Omar Haddad,no,,no,Dyslexia,yes,.,101,,,,,,,
";

const TIMETABLE: &str = "\
Day,Time Slot,Course/Class,Staff,Room,Suspended?
Monday,08:40 - 09:00,Tutor: 9X/Tu,ABC,T1,No
Monday,09:00 - 10:00,Maths: 9X/Ma1,DEF,M2,No
Monday,11:00 - 12:00,History: 9X/Hi2,GHI,H1,No
Tuesday,09:00 - 10:00,Maths: 9X/Ma1,DEF,M2,Yes
";

fn import(kind: DatasetKind, body: &str) -> NormalizedDataset {
    DatasetImporter::from_reader(kind, body.as_bytes())
        .expect("dataset imports")
        .0
}

fn service_with_policy(
    policy: AggregationPolicy,
) -> NeedAnalysisService<InMemoryWeightingConfigs, InMemoryDatasets, InMemoryResults> {
    let service = NeedAnalysisService::with_policy(
        Arc::new(InMemoryWeightingConfigs::default()),
        Arc::new(InMemoryDatasets::default()),
        Arc::new(InMemoryResults::default()),
        policy,
    );
    service
        .ingest(DatasetKind::StudentsClasses, ENROLMENT.as_bytes())
        .expect("enrolment");
    service
        .ingest(DatasetKind::StudentsSen, NEEDS.as_bytes())
        .expect("needs");
    service
        .ingest(DatasetKind::Timetable, TIMETABLE.as_bytes())
        .expect("timetable");
    service
}

#[test]
fn alias_headers_and_presence_columns_normalize() {
    let NormalizedDataset::Needs(profiles) = import(DatasetKind::StudentsSen, NEEDS) else {
        panic!("needs dataset expected");
    };

    let jane = &profiles[0];
    assert!(jane.pupil_premium && jane.looked_after && jane.boxall);
    assert_eq!(jane.sen_need_types.len(), 3);
    assert_eq!(jane.medical_entries, 2);
    assert_eq!(jane.support_stage, 3);

    let omar = &profiles[1];
    assert!(omar.sen_need_types.is_empty());
    assert_eq!(omar.reading_score, None);
    assert_eq!(omar.spelling_score, Some(101.0));
}

#[test]
fn suspended_sessions_never_reach_the_grid() {
    let NormalizedDataset::Timetable(sessions) = import(DatasetKind::Timetable, TIMETABLE) else {
        panic!("timetable dataset expected");
    };
    assert_eq!(sessions.len(), 3);
    assert!(sessions.iter().all(|session| session.day == "Monday"));
}

#[test]
fn end_to_end_run_with_tutor_time_excluded() {
    let service = service_with_policy(AggregationPolicy {
        max_class_size: None,
        excluded_time_slots: vec!["08:40 - 09:00".to_string()],
    });
    let config = service
        .save_config(WeightingConfigDraft::default_for(SchoolId(
            "riverside".to_string(),
        )))
        .expect("config saved");

    let stored = service.run(&config.id).expect("run succeeds");
    let report = &stored.result.report;

    // 2 + 3 + 9 + 2 + 2 + 2 + 2 + 3
    let jane = &report.top_students[0];
    assert_eq!(jane.name, "Jane Smith");
    assert_eq!(jane.score, 25.0);
    assert_eq!(jane.band, NeedBand::High);

    assert_eq!(report.statistics.total_students, 3);
    assert_eq!(report.statistics.unmatched_students, 1);
    assert_eq!(report.statistics.excluded_classes, 1);

    let codes: Vec<&str> = report
        .top_classes
        .iter()
        .map(|class| class.class_code.as_str())
        .collect();
    assert_eq!(codes, vec!["9X/Ma1", "9X/Hi2"]);
    assert_eq!(report.top_classes[0].weighted_score, 26.0);
    assert_eq!(report.top_classes[0].priority, PriorityBand::High);

    assert!(report
        .timetable_grid
        .iter()
        .all(|slot| slot.time_slot != "08:40 - 09:00"));
}

#[test]
fn scenario_c_missing_sen_column_blocks_the_run() {
    let service = NeedAnalysisService::new(
        Arc::new(InMemoryWeightingConfigs::default()),
        Arc::new(InMemoryDatasets::default()),
        Arc::new(InMemoryResults::default()),
    );
    let error = service
        .ingest(
            DatasetKind::StudentsSen,
            NEEDS.replacen(",SEN,", ",Support Notes,", 1).as_bytes(),
        )
        .expect_err("schema rejected");
    assert_eq!(error.kind(), "SchemaError");
    assert!(error.to_string().contains("SEN at any time this academic year?"));

    let config = service
        .save_config(WeightingConfigDraft::default_for(SchoolId(
            "riverside".to_string(),
        )))
        .expect("config saved");
    assert!(matches!(
        service.run(&config.id),
        Err(AnalysisError::MissingDataset(_))
    ));
}

#[test]
fn pure_pipeline_matches_the_service() {
    let service = service_with_policy(AggregationPolicy::default());
    let config = service
        .save_config(WeightingConfigDraft::default_for(SchoolId(
            "riverside".to_string(),
        )))
        .expect("config saved");
    let stored = service.run(&config.id).expect("run succeeds");

    let snapshot = service
        .dataset_status()
        .expect("status")
        .snapshot()
        .expect("snapshot");
    let direct = compute_report(&snapshot, &NeedWeights::default(), &AggregationPolicy::default());

    assert_eq!(direct, stored.result.report);
}
