use evs_core::provenance::{RunProvenance, SchemaVersion};
use evs_core::{EvsError, EventId, FourVector, Level, SysShift};

#[test]
fn provenance_round_trip_json() {
    let provenance = RunProvenance {
        config_hash: "abc".into(),
        chain: "DjBkg".into(),
        sys_shift: 3,
        schema_version: SchemaVersion::new(1, 0, 0),
        created_at: "2023-10-31T00:00:00Z".into(),
        tool_versions: [("evs-core".into(), "0.1.0".into())].into_iter().collect(),
    };
    let json = serde_json::to_string_pretty(&provenance).expect("serialize");
    let decoded: RunProvenance = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(decoded, provenance);
}

#[test]
fn sys_shift_is_transparent() {
    let json = serde_json::to_string(&SysShift::from_raw(12)).expect("serialize");
    assert_eq!(json, "12");
    let nominal: SysShift = serde_json::from_str("-9999").expect("deserialize");
    assert!(nominal.is_nominal());
    assert_eq!(SysShift::default(), SysShift::NOMINAL);
}

#[test]
fn level_and_event_id_serialize_compactly() {
    assert_eq!(serde_json::to_string(&Level::Gen).unwrap(), "\"gen\"");
    let id: EventId = serde_json::from_str(r#"{"run":250000,"event":17}"#).unwrap();
    assert_eq!(id.to_string(), "250000/17");
}

#[test]
fn error_round_trip_keeps_family() {
    let err = EvsError::missing("HFS_E", "no hadronic final state");
    let json = serde_json::to_string(&err).expect("serialize");
    assert!(json.contains("\"family\":\"Extraction\""));
    let decoded: EvsError = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(decoded, err);
}

#[test]
fn four_vector_round_trip() {
    let v = FourVector::new(1.0, -2.0, 3.5, 10.0);
    let json = serde_json::to_string(&v).unwrap();
    let decoded: FourVector = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, v);
}

#[test]
fn schema_version_is_a_dotted_string() {
    let version = SchemaVersion::new(1, 2, 0);
    assert_eq!(serde_json::to_string(&version).unwrap(), "\"1.2.0\"");
    let parsed: SchemaVersion = serde_json::from_str("\"1.0.3\"").unwrap();
    assert!(version.reads(&parsed));
    assert!(!version.reads(&SchemaVersion::new(2, 0, 0)));
    assert!(serde_json::from_str::<SchemaVersion>("\"1.x.0\"").is_err());
    assert!("1.0".parse::<SchemaVersion>().is_err());
}
