use flocknote_core::db::open_db_in_memory;
use flocknote_core::{
    AttendanceDate, AttendanceRecord, CallReason, CallTarget, Member, RosterProvider,
    SqliteRosterRepository,
};

#[test]
fn attendance_record_serializes_canonical_date_key() {
    let record = AttendanceRecord {
        member_id: "m-42".to_string(),
        sunday_date: AttendanceDate::from_ymd(2024, 3, 10).unwrap(),
        present: false,
        notes: Some("called, will return".to_string()),
    };

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["member_id"], "m-42");
    assert_eq!(json["sunday_date"], "2024-03-10");
    assert_eq!(json["present"], false);
    assert_eq!(json["notes"], "called, will return");

    let decoded: AttendanceRecord = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, record);
}

#[test]
fn deserialize_rejects_non_canonical_date() {
    let value = serde_json::json!({
        "member_id": "m-42",
        "sunday_date": "2024-03-10T09:00:00Z",
        "present": true,
        "notes": null
    });

    let err = serde_json::from_value::<AttendanceRecord>(value).unwrap_err();
    assert!(err.to_string().contains("expected YYYY-MM-DD"), "{err}");
}

#[test]
fn call_target_reason_uses_snake_case_wire_name() {
    let target = CallTarget {
        member: Member::new("m-1", "Ana", "Ruiz"),
        reason: CallReason::AbsentThisWeek,
    };
    let json = serde_json::to_value(&target).unwrap();
    assert_eq!(json["reason"], "absent_this_week");
    assert_eq!(json["member"]["is_active"], true);
}

#[test]
fn roster_cache_upserts_and_orders_by_name() {
    let conn = open_db_in_memory().unwrap();
    let roster = SqliteRosterRepository::try_new(&conn).unwrap();

    let mut ben = Member::new("m-2", "Ben", "Ortiz");
    ben.phone_primary = Some("+1 555 0100".to_string());
    roster.upsert_member(&ben).unwrap();
    roster.upsert_member(&Member::new("m-1", "Ana", "Alvarez")).unwrap();

    ben.is_active = false;
    ben.area_id = Some("zone-north".to_string());
    roster.upsert_member(&ben).unwrap();

    let members = roster.list_members().unwrap();
    let ids: Vec<&str> = members.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["m-1", "m-2"]);

    let stored = roster.get_member("m-2").unwrap().unwrap();
    assert!(!stored.is_active);
    assert_eq!(stored.area_id.as_deref(), Some("zone-north"));
    assert_eq!(stored.phone_primary.as_deref(), Some("+1 555 0100"));
    assert!(roster.get_member("missing").unwrap().is_none());
}

#[test]
fn roster_cache_rejects_blank_member_id() {
    let conn = open_db_in_memory().unwrap();
    let roster = SqliteRosterRepository::try_new(&conn).unwrap();
    assert!(roster.upsert_member(&Member::new(" ", "No", "Id")).is_err());
}
