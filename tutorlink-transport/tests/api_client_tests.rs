use tokio::task::JoinHandle;
use tutorlink_server::Server;
use tutorlink_transport::{ApiClient, Error, Role, SendMessageRequest, Session};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(format!(
            "{}=trace,tutorlink_transport=trace,tutorlink_server=debug",
            module_path!()
        ))
        .try_init();
}

struct Fixture {
    base_url: String,
    tutor_id: i64,
    student_id: i64,
    server_task: JoinHandle<()>,
}

async fn create_server() -> Fixture {
    let server = Server::new("127.0.0.1:0").await.unwrap();
    let tutor = server
        .register_user("Nguyen Linh", "linh@example.com", Role::Tutor, "tutor-token")
        .await;
    let student = server
        .register_user("Tran Minh", "minh@example.com", Role::Student, "student-token")
        .await;
    let base_url = server.base_url().unwrap();
    let server_task = tokio::spawn(async move {
        let _ = server.run().await;
    });
    Fixture {
        base_url,
        tutor_id: tutor.id,
        student_id: student.id,
        server_task,
    }
}

#[tokio::test]
async fn test_current_user_and_users_by_role() {
    init_tracing();
    let fixture = create_server().await;
    let client = ApiClient::new(Session::with_token(&fixture.base_url, "tutor-token"));
    let me = client.current_user().await.unwrap();
    assert_eq!(me.id, fixture.tutor_id);
    assert_eq!(me.role, Role::Tutor);
    assert_eq!(me.full_name.as_deref(), Some("Nguyen Linh"));
    let students = client.users_by_role(me.role.counterpart()).await.unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].id, fixture.student_id);
    fixture.server_task.abort();
}

#[tokio::test]
async fn test_send_then_fetch_conversation_from_both_sides() {
    init_tracing();
    let fixture = create_server().await;
    let tutor = ApiClient::new(Session::with_token(&fixture.base_url, "tutor-token"));
    let student = ApiClient::new(Session::with_token(&fixture.base_url, "student-token"));
    let first = tutor
        .send_message(&SendMessageRequest {
            receiver_id: fixture.student_id,
            content: "Homework is due Friday".into(),
        })
        .await
        .unwrap();
    assert_eq!(first.sender_id, fixture.tutor_id);
    assert_eq!(first.receiver_id, fixture.student_id);
    assert!(!first.is_read);
    let second = student
        .send_message(&SendMessageRequest {
            receiver_id: fixture.tutor_id,
            content: "Got it".into(),
        })
        .await
        .unwrap();
    assert!(second.id > first.id);
    let from_tutor = tutor.get_conversation(fixture.student_id).await.unwrap();
    let from_student = student.get_conversation(fixture.tutor_id).await.unwrap();
    assert_eq!(from_tutor, from_student);
    let ids: Vec<_> = from_tutor.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
    fixture.server_task.abort();
}

#[tokio::test]
async fn test_mark_conversation_read_only_affects_received_messages() {
    init_tracing();
    let fixture = create_server().await;
    let tutor = ApiClient::new(Session::with_token(&fixture.base_url, "tutor-token"));
    let student = ApiClient::new(Session::with_token(&fixture.base_url, "student-token"));
    for content in ["one", "two"] {
        tutor
            .send_message(&SendMessageRequest {
                receiver_id: fixture.student_id,
                content: content.into(),
            })
            .await
            .unwrap();
    }
    student
        .send_message(&SendMessageRequest {
            receiver_id: fixture.tutor_id,
            content: "three".into(),
        })
        .await
        .unwrap();
    student
        .mark_conversation_read(fixture.tutor_id)
        .await
        .unwrap();
    let messages = student.get_conversation(fixture.tutor_id).await.unwrap();
    let read: Vec<_> = messages.iter().map(|m| m.is_read).collect();
    assert_eq!(read, vec![true, true, false]);
    fixture.server_task.abort();
}

#[tokio::test]
async fn test_unread_and_all_messages_newest_first() {
    init_tracing();
    let fixture = create_server().await;
    let tutor = ApiClient::new(Session::with_token(&fixture.base_url, "tutor-token"));
    let student = ApiClient::new(Session::with_token(&fixture.base_url, "student-token"));
    for content in ["first", "second"] {
        tutor
            .send_message(&SendMessageRequest {
                receiver_id: fixture.student_id,
                content: content.into(),
            })
            .await
            .unwrap();
    }
    student
        .send_message(&SendMessageRequest {
            receiver_id: fixture.tutor_id,
            content: "reply".into(),
        })
        .await
        .unwrap();

    let unread = student.unread_messages().await.unwrap();
    let contents: Vec<_> = unread.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["second", "first"]);
    assert!(unread.iter().all(|m| m.receiver_id == fixture.student_id && !m.is_read));

    let all = tutor.all_messages().await.unwrap();
    let contents: Vec<_> = all.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["reply", "second", "first"]);
    assert_eq!(all[0].sender_name.as_deref(), Some("Tran Minh"));

    student
        .mark_conversation_read(fixture.tutor_id)
        .await
        .unwrap();
    assert!(student.unread_messages().await.unwrap().is_empty());
    assert_eq!(student.all_messages().await.unwrap().len(), 3);
    fixture.server_task.abort();
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized() {
    init_tracing();
    let fixture = create_server().await;
    let client = ApiClient::new(Session::with_token(&fixture.base_url, "bogus"));
    let err = client.get_conversation(fixture.student_id).await.unwrap_err();
    assert!(err.is_unauthorized(), "unexpected error: {err:?}");
    fixture.server_task.abort();
}

#[tokio::test]
async fn test_logged_out_session_fails_without_request() {
    init_tracing();
    let fixture = create_server().await;
    let session = Session::with_token(&fixture.base_url, "tutor-token");
    let client = ApiClient::new(session.clone());
    assert!(client.current_user().await.is_ok());
    session.logout();
    let err = client.current_user().await.unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));
    fixture.server_task.abort();
}

#[tokio::test]
async fn test_rejected_send_reports_status_and_message() {
    init_tracing();
    let fixture = create_server().await;
    let client = ApiClient::new(Session::with_token(&fixture.base_url, "tutor-token"));
    let err = client
        .send_message(&SendMessageRequest {
            receiver_id: 999,
            content: "anyone there?".into(),
        })
        .await
        .unwrap_err();
    match err {
        Error::Status { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("Receiver not found"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    fixture.server_task.abort();
}

#[tokio::test]
async fn test_unreachable_server_is_request_error() {
    init_tracing();
    let client = ApiClient::new(Session::with_token("http://127.0.0.1:1", "tutor-token"));
    let err = client.current_user().await.unwrap_err();
    assert!(matches!(err, Error::Request(_)), "unexpected error: {err:?}");
}
