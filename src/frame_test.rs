use super::*;

#[test]
fn request_sets_fields() {
    let frame = Frame::request("research:run", Data::new());
    assert_eq!(frame.syscall, "research:run");
    assert_eq!(frame.status, Status::Request);
    assert!(frame.parent_id.is_none());
    assert!(frame.ts > 0);
}

#[test]
fn reply_inherits_context() {
    let req = Frame::request("research:run", Data::new());
    let item = req.item(Data::new());

    assert_eq!(item.parent_id, Some(req.id));
    assert_eq!(item.syscall, "research:run");
    assert_eq!(item.status, Status::Item);
    assert_ne!(item.id, req.id);
}

#[test]
fn done_is_terminal() {
    assert!(Status::Done.is_terminal());
    assert!(Status::Error.is_terminal());
    assert!(Status::Cancel.is_terminal());
    assert!(!Status::Request.is_terminal());
    assert!(!Status::Item.is_terminal());
}

#[test]
fn prefix_and_op_extraction() {
    let frame = Frame::request("research:run", Data::new());
    assert_eq!(frame.prefix(), "research");
    assert_eq!(frame.op(), "run");

    let frame = Frame::request("noseparator", Data::new());
    assert_eq!(frame.prefix(), "noseparator");
    assert_eq!(frame.op(), "");
}

#[test]
fn item_carries_chunk_content() {
    let req = Frame::request("research:run", Data::new());
    let item = req.item(Data::new()).with_content("# Report");
    assert_eq!(item.str_field(FRAME_CONTENT), Some("# Report"));
}

#[test]
fn inbound_frame_without_data_parses() {
    let id = Uuid::new_v4();
    let json = format!(r#"{{"id":"{id}","parent_id":null,"ts":1,"syscall":"research:run","status":"request"}}"#);
    let frame: Frame = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(frame.id, id);
    assert!(frame.data.is_empty());
}

#[test]
fn json_keeps_status_lowercase() {
    let frame = Frame::request("research:run", Data::new()).with_data("query", "rust");
    let json = serde_json::to_value(&frame).expect("serialize");
    assert_eq!(json["status"], "request");
    assert_eq!(json["data"]["query"], "rust");
}

#[test]
fn error_from_typed() {
    #[derive(Debug, thiserror::Error)]
    #[error("not found")]
    struct NotFound;

    impl ErrorCode for NotFound {
        fn error_code(&self) -> &'static str {
            "E_NOT_FOUND"
        }
    }

    let req = Frame::request("research:run", Data::new());
    let err = req.error_from(&NotFound);

    assert_eq!(err.status, Status::Error);
    assert_eq!(err.str_field(FRAME_CODE), Some("E_NOT_FOUND"));
    assert_eq!(err.str_field(FRAME_MESSAGE), Some("not found"));
    assert_eq!(
        err.data
            .get(FRAME_RETRYABLE)
            .and_then(serde_json::Value::as_bool),
        Some(false)
    );
}

#[test]
fn cancel_references_target() {
    let req = Frame::request("research:run", Data::new());
    let cancel = Frame::cancel(req.id);

    assert_eq!(cancel.parent_id, Some(req.id));
    assert_eq!(cancel.status, Status::Cancel);
    assert!(cancel.status.is_terminal());

    let ack = req.cancelled();
    assert_eq!(ack.parent_id, Some(req.id));
    assert_eq!(ack.status, Status::Cancel);
}
