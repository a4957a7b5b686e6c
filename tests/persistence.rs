mod support;

use support::{at, entry, finished, lookups, open, TestDb};
use tracker::{Database, Error, Snapshot, Task};

#[test]
fn tasks_survive_reopening_the_database() {
    let db = TestDb::new();
    {
        let mut service = db.service();
        service
            .add_task(&Task::new("open", Some(at("2021-05-24T10:00:00Z"))))
            .unwrap();
        service
            .add_task(&Task::finished(
                "done",
                at("2021-05-22T10:00:00Z"),
                at("2021-05-25T12:00:00Z"),
            ))
            .unwrap();
    }

    let service = db.service();
    assert_eq!(
        service.get_all_open_tasks().unwrap(),
        vec![open(1, "open", "2021-05-24T10:00:00Z")]
    );
    assert_eq!(
        service.get_all_finished_tasks().unwrap(),
        vec![finished(1, "done", "2021-05-22T10:00:00Z", "2021-05-25T12:00:00Z")]
    );
    assert_eq!(
        lookups(&service),
        vec![entry("2021-5-17", &[1]), entry("2021-5-24", &[1])]
    );
}

#[test]
fn ids_are_not_reused_after_removal() {
    let db = TestDb::new();
    let mut service = db.service();
    let first = service
        .add_task(&Task::new("first", Some(at("2021-05-24T10:00:00Z"))))
        .unwrap();
    service
        .remove_task(&open(first, "first", "2021-05-24T10:00:00Z"))
        .unwrap();

    let second = service
        .add_task(&Task::new("second", Some(at("2021-05-24T11:00:00Z"))))
        .unwrap();
    assert_eq!((first, second), (1, 2));
}

#[test]
fn export_has_the_documented_shape() {
    let db = TestDb::new();
    let mut service = db.service();
    service
        .add_task(&Task::new("open", Some(at("2021-05-24T10:00:00Z"))))
        .unwrap();
    service
        .add_task(&Task::finished(
            "done",
            at("2021-05-24T10:00:00Z"),
            at("2021-05-24T12:00:00Z"),
        ))
        .unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&service.export().unwrap().to_json().unwrap()).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "finishedTasks": [
                { "id": 1, "content": "done", "start": "2021-05-24T10:00:00Z", "end": "2021-05-24T12:00:00Z" }
            ],
            "openTasks": [
                { "id": 1, "content": "open", "start": "2021-05-24T10:00:00Z" }
            ],
            "lookup": { "2021-5-24": [1] }
        })
    );
}

#[test]
fn import_restores_an_export_into_a_fresh_database() {
    let source = TestDb::new();
    let mut service = source.service();
    service
        .add_task(&Task::new("a", Some(at("2021-05-24T10:00:00Z"))))
        .unwrap();
    service
        .add_task(&Task::new("b", Some(at("2021-05-24T11:00:00Z"))))
        .unwrap();
    service
        .remove_task(&open(1, "a", "2021-05-24T10:00:00Z"))
        .unwrap();
    service
        .add_task(&Task::finished(
            "c",
            at("2021-05-22T10:00:00Z"),
            at("2021-05-25T12:00:00Z"),
        ))
        .unwrap();
    let text = service.export().unwrap().to_json().unwrap();

    let target = TestDb::new();
    let mut restored = target.service();
    restored.import(&Snapshot::parse(&text).unwrap()).unwrap();

    assert_eq!(restored.export().unwrap(), service.export().unwrap());
    // the open sequence continues after the highest imported id
    let next = restored
        .add_task(&Task::new("d", Some(at("2021-05-26T11:00:00Z"))))
        .unwrap();
    assert_eq!(next, 3);
}

#[test]
fn import_rebuilds_a_wrong_lookup() {
    let db = TestDb::new();
    let mut service = db.service();
    let snapshot = Snapshot::parse(
        r#"{
            "finishedTasks": [
                { "id": 4, "content": "a", "start": "2021-05-22T10:00:00Z", "end": "2021-05-25T12:00:00Z" }
            ],
            "openTasks": [],
            "lookup": { "2021-5-31": [4] }
        }"#,
    )
    .unwrap();

    service.import(&snapshot).unwrap();
    assert_eq!(
        lookups(&service),
        vec![entry("2021-5-17", &[4]), entry("2021-5-24", &[4])]
    );
}

#[test]
fn import_refuses_a_non_empty_database() {
    let db = TestDb::new();
    let mut service = db.service();
    service
        .add_task(&Task::new("a", Some(at("2021-05-24T10:00:00Z"))))
        .unwrap();

    let err = service.import(&Snapshot::default()).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn import_refuses_tasks_without_ids() {
    let db = TestDb::new();
    let mut service = db.service();
    let snapshot = Snapshot {
        open_tasks: vec![Task::new("a", Some(at("2021-05-24T10:00:00Z")))],
        ..Snapshot::default()
    };

    assert!(matches!(
        service.import(&snapshot),
        Err(Error::Validation(_))
    ));
    assert!(service.get_all_open_tasks().unwrap().is_empty());
}

#[test]
fn reset_starts_over() {
    let db = TestDb::new();
    {
        let mut service = db.service();
        service
            .add_task(&Task::new("a", Some(at("2021-05-24T10:00:00Z"))))
            .unwrap();
    }

    Database::reset(db.path()).unwrap();
    let service = db.service();
    assert!(service.get_all_open_tasks().unwrap().is_empty());
}
