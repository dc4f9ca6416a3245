//! 核心场景测试 / Core scenario tests
//!
//! 仿真连接直接注入服务端（mpsc通道对），不经过真实socket
//! Fake connections are injected straight into the hub as mpsc pairs, no real sockets

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use edu_connect_hub::config::{AuthConfigLite, PushConfigLite, ServerConfig};
use edu_connect_hub::domain::event::{EventFrame, Outbound};
use edu_connect_hub::domain::model::{Identity, RecipientSet, Role};
use edu_connect_hub::error::HubError;
use edu_connect_hub::hub::router::user_channel;
use edu_connect_hub::hub::{Collaborators, Connection, EduConnectServer};
use edu_connect_hub::service::auth::StaticIdentityVerifier;
use edu_connect_hub::service::push::PushDelivery;
use edu_connect_hub::storage::memory::{
    MemoryAttachmentStore, MemoryGroupStore, MemoryMessageStore, MemoryNotificationStore,
    MemoryUserStore,
};
use edu_connect_hub::storage::{GroupRecord, GroupStore, MessageStore, NotificationStore};

/// 记录型推送桩 / Recording push stub
#[derive(Default)]
struct RecordingPush {
    calls: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl PushDelivery for RecordingPush {
    async fn send(
        &self,
        recipient_id: &str,
        title: &str,
        body: &str,
        _data: &serde_json::Value,
    ) -> Result<()> {
        self.calls.lock().push((recipient_id.to_string(), title.to_string(), body.to_string()));
        Ok(())
    }
}

/// 永不完成的推送桩 / Push stub that never completes
struct StalledPush;

#[async_trait]
impl PushDelivery for StalledPush {
    async fn send(&self, _: &str, _: &str, _: &str, _: &serde_json::Value) -> Result<()> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// 故障群组后端桩 / Failing group-backend stub
struct FailingGroupStore;

#[async_trait]
impl GroupStore for FailingGroupStore {
    async fn create(&self, _: &str, _: &str) -> Result<GroupRecord> {
        anyhow::bail!("group backend down")
    }
    async fn get(&self, _: &str) -> Result<Option<GroupRecord>> {
        anyhow::bail!("group backend down")
    }
    async fn delete(&self, _: &str) -> Result<()> {
        anyhow::bail!("group backend down")
    }
    async fn add_member(&self, _: &str, _: &str) -> Result<()> {
        anyhow::bail!("group backend down")
    }
    async fn remove_member(&self, _: &str, _: &str) -> Result<()> {
        anyhow::bail!("group backend down")
    }
    async fn is_member(&self, _: &str, _: &str) -> Result<bool> {
        anyhow::bail!("group backend down")
    }
    async fn members(&self, _: &str) -> Result<Vec<String>> {
        anyhow::bail!("group backend down")
    }
    async fn groups_for_user(&self, _: &str) -> Result<Vec<String>> {
        anyhow::bail!("group backend down")
    }
}

struct TestBed {
    server: EduConnectServer,
    messages: Arc<MemoryMessageStore>,
    notifications: Arc<MemoryNotificationStore>,
    users: Arc<MemoryUserStore>,
    attachments: Arc<MemoryAttachmentStore>,
    push: Arc<RecordingPush>,
}

fn test_bed() -> TestBed {
    let messages = Arc::new(MemoryMessageStore::new());
    let notifications = Arc::new(MemoryNotificationStore::new());
    let groups = Arc::new(MemoryGroupStore::new());
    let users = Arc::new(MemoryUserStore::new());
    let attachments = Arc::new(MemoryAttachmentStore::new());
    let push = Arc::new(RecordingPush::default());

    let server = EduConnectServer::new(
        ServerConfig {
            host: "127.0.0.1".to_string(),
            ws_port: 0,
            http_port: 0,
            timeout_ms: 60000,
            auth_deadline_ms: 2000,
        },
        AuthConfigLite { enabled: false, center_url: String::new(), timeout_ms: 1000 },
        PushConfigLite { url: None, timeout_ms: 1000, secret: None, enabled: false },
        Collaborators {
            verifier: Arc::new(StaticIdentityVerifier::new()),
            push: push.clone(),
            messages: messages.clone(),
            notifications: notifications.clone(),
            groups,
            users: users.clone(),
            attachments: attachments.clone(),
        },
    );
    TestBed { server, messages, notifications, users, attachments, push }
}

/// 替换群组/推送协作方的组装 / Assembly with swapped group/push collaborators
fn server_with(
    groups: Arc<dyn GroupStore>,
    push: Arc<dyn PushDelivery>,
) -> (EduConnectServer, Arc<MemoryUserStore>, Arc<MemoryNotificationStore>) {
    let users = Arc::new(MemoryUserStore::new());
    let notifications = Arc::new(MemoryNotificationStore::new());
    let server = EduConnectServer::new(
        ServerConfig {
            host: "127.0.0.1".to_string(),
            ws_port: 0,
            http_port: 0,
            timeout_ms: 60000,
            auth_deadline_ms: 2000,
        },
        AuthConfigLite { enabled: false, center_url: String::new(), timeout_ms: 1000 },
        PushConfigLite { url: None, timeout_ms: 1000, secret: None, enabled: false },
        Collaborators {
            verifier: Arc::new(StaticIdentityVerifier::new()),
            push,
            messages: Arc::new(MemoryMessageStore::new()),
            notifications: notifications.clone(),
            groups,
            users: users.clone(),
            attachments: Arc::new(MemoryAttachmentStore::new()),
        },
    );
    (server, users, notifications)
}

fn ident(id: &str, role: Role) -> Identity {
    Identity { id: id.to_string(), role }
}

/// 等后台推送任务跑完 / Wait for background push tasks to finish
async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
}

/// 注入一个仿真会话 / Inject a fake session
async fn attach(
    server: &EduConnectServer,
    user_id: &str,
    role: Role,
) -> (String, mpsc::UnboundedReceiver<Outbound>) {
    let (tx, rx) = mpsc::unbounded_channel::<Outbound>();
    let conn_id = format!("conn-{}-{}", user_id, uuid::Uuid::new_v4());
    let conn = Connection {
        conn_id: conn_id.clone(),
        user_id: user_id.to_string(),
        role,
        addr: "127.0.0.1:0".parse().unwrap(),
        sender: tx,
        connected_at: chrono::Utc::now().timestamp_millis(),
        last_heartbeat: Arc::new(parking_lot::Mutex::new(Instant::now())),
    };
    server.join_session(conn).await.unwrap();
    (conn_id, rx)
}

/// 取走当前已排队的全部事件 / Drain every queued event
fn drain(rx: &mut mpsc::UnboundedReceiver<Outbound>) -> Vec<EventFrame> {
    let mut frames = Vec::new();
    while let Ok(outbound) = rx.try_recv() {
        if let Outbound::Event(frame) = outbound {
            frames.push(frame);
        }
    }
    frames
}

fn count_of(frames: &[EventFrame], event_type: &str) -> usize {
    frames.iter().filter(|f| f.event_type == event_type).count()
}

#[tokio::test]
async fn presence_bulk_sync_and_transitions() {
    let bed = test_bed();
    let (_, mut rx1) = attach(&bed.server, "u1", Role::Student).await;

    let frames = drain(&mut rx1);
    let sync = frames.iter().find(|f| f.event_type == "presence.bulkSync").expect("bulkSync");
    let ids: Vec<String> =
        serde_json::from_value(sync.data["onlineUserIds"].clone()).unwrap();
    assert_eq!(ids, vec!["u1".to_string()]);
    assert_eq!(count_of(&frames, "presence.changed"), 1);

    let (_, mut rx2) = attach(&bed.server, "u2", Role::Student).await;
    let frames2 = drain(&mut rx2);
    let sync2 = frames2.iter().find(|f| f.event_type == "presence.bulkSync").unwrap();
    let mut ids2: Vec<String> =
        serde_json::from_value(sync2.data["onlineUserIds"].clone()).unwrap();
    ids2.sort();
    assert_eq!(ids2, vec!["u1".to_string(), "u2".to_string()]);

    // u1收到u2的上线跃迁 / u1 observes u2's online transition
    let frames1 = drain(&mut rx1);
    assert!(frames1
        .iter()
        .any(|f| f.event_type == "presence.changed" && f.data["userId"] == "u2"));
}

#[tokio::test]
async fn second_concurrent_connection_is_silent() {
    let bed = test_bed();
    let (_, mut observer) = attach(&bed.server, "observer", Role::Admin).await;
    drain(&mut observer);

    let (conn_a, _rx_a) = attach(&bed.server, "u1", Role::Student).await;
    let (conn_b, _rx_b) = attach(&bed.server, "u1", Role::Student).await;

    let frames = drain(&mut observer);
    assert_eq!(count_of(&frames, "presence.changed"), 1, "only the 0→1 transition announces");
    assert!(bed.server.presence.is_online("u1"));
    assert_eq!(bed.server.presence.session_count("u1"), 2);

    // 第一条断开：仍在线，无广播 / First disconnect: still online, no broadcast
    bed.server.leave_session(&conn_a);
    assert!(drain(&mut observer).is_empty());
    assert!(bed.server.presence.is_online("u1"));

    // 第二条断开：1→0广播下线 / Second disconnect: 1→0 broadcasts offline
    bed.server.leave_session(&conn_b);
    let frames = drain(&mut observer);
    assert!(frames
        .iter()
        .any(|f| f.event_type == "presence.changed" && f.data["online"] == false));
    assert!(!bed.server.presence.is_online("u1"));
}

#[tokio::test]
async fn direct_message_to_offline_recipient() {
    let bed = test_bed();
    bed.users.seed("alice", "Alice", Role::Student, None);
    bed.users.seed("bob", "Bob", Role::Student, None);

    // A在线，B离线 / A online, B offline
    let (_, mut rx_a) = attach(&bed.server, "alice", Role::Student).await;
    drain(&mut rx_a);

    let record = bed
        .server
        .send_direct_message(
            &ident("alice", Role::Student),
            "bob",
            Some("hi".to_string()),
            None,
        )
        .await
        .unwrap();

    // 落库不依赖接收者在线 / Persistence is independent of recipient presence
    assert_eq!(bed.messages.direct_count(), 1);
    assert!(!record.is_read);

    // B恰好一条通知，推送恰好一次 / Exactly one notification row and one push for B
    let bob_notifications = bed.notifications.all_for("bob");
    assert_eq!(bob_notifications.len(), 1);
    assert_eq!(bob_notifications[0].kind, "message.direct");
    assert_eq!(bob_notifications[0].message, "hi");
    settle().await;
    let pushes = bed.push.calls.lock();
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0].0, "bob");

    // 发送者回显 / Sender echo
    let frames = drain(&mut rx_a);
    assert_eq!(count_of(&frames, "message.new"), 1);
    assert_eq!(frames.iter().find(|f| f.event_type == "message.new").unwrap().data["id"], record.id);
}

#[tokio::test]
async fn missing_body_and_attachment_is_rejected() {
    let bed = test_bed();
    bed.users.seed("bob", "Bob", Role::Student, None);
    let err = bed
        .server
        .send_direct_message(&ident("alice", Role::Student), "bob", Some("   ".to_string()), None)
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::Validation(_)));
    assert_eq!(bed.messages.direct_count(), 0);

    // 空附件不算内容 / An empty attachment is not content
    let err = bed
        .server
        .send_direct_message(&ident("alice", Role::Student), "bob", None, Some("  ".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::Validation(_)));
    assert_eq!(bed.messages.direct_count(), 0);

    let err = bed
        .server
        .send_direct_message(&ident("alice", Role::Student), "ghost", Some("hi".to_string()), None)
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::NotFound(_)));
}

#[tokio::test]
async fn only_sender_may_edit_or_delete() {
    let bed = test_bed();
    bed.users.seed("alice", "Alice", Role::Student, None);
    bed.users.seed("bob", "Bob", Role::Student, None);

    let record = bed
        .server
        .send_direct_message(&ident("alice", Role::Student), "bob", Some("v1".to_string()), None)
        .await
        .unwrap();

    let err = bed
        .server
        .edit_direct_message(&ident("bob", Role::Student), &record.id, "hacked".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::Authorization(_)));
    // 记录保持不变 / Record unchanged
    let stored = bed.messages.get_direct(&record.id).await.unwrap().unwrap();
    assert_eq!(stored.body.as_deref(), Some("v1"));

    let err = bed
        .server
        .delete_direct_message(&ident("bob", Role::Student), &record.id)
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::Authorization(_)));
    assert_eq!(bed.messages.direct_count(), 1);

    // 原发送者可以 / The original sender may
    let updated = bed
        .server
        .edit_direct_message(&ident("alice", Role::Student), &record.id, "v2".to_string())
        .await
        .unwrap();
    assert_eq!(updated.body.as_deref(), Some("v2"));
    bed.server
        .delete_direct_message(&ident("alice", Role::Student), &record.id)
        .await
        .unwrap();
    assert_eq!(bed.messages.direct_count(), 0);
}

#[tokio::test]
async fn attachment_removal_is_best_effort() {
    let bed = test_bed();
    bed.users.seed("alice", "Alice", Role::Student, None);
    bed.users.seed("bob", "Bob", Role::Student, None);

    let record = bed
        .server
        .send_direct_message(
            &ident("alice", Role::Student),
            "bob",
            None,
            Some("uploads/a.pdf".to_string()),
        )
        .await
        .unwrap();

    // 附件后端故障不阻止删除 / Attachment backend failure never blocks deletion
    bed.attachments
        .fail_removals
        .store(true, std::sync::atomic::Ordering::Relaxed);
    bed.server
        .delete_direct_message(&ident("alice", Role::Student), &record.id)
        .await
        .unwrap();
    assert_eq!(bed.messages.direct_count(), 0);
    assert!(bed.attachments.removed_paths().is_empty());
}

#[tokio::test]
async fn thread_read_marks_only_that_sender_and_is_idempotent() {
    let bed = test_bed();
    for (id, name) in [("alice", "Alice"), ("bob", "Bob"), ("carol", "Carol")] {
        bed.users.seed(id, name, Role::Student, None);
    }
    let alice = ident("alice", Role::Student);
    let carol = ident("carol", Role::Student);
    let bob = ident("bob", Role::Student);

    bed.server.send_direct_message(&alice, "bob", Some("1".into()), None).await.unwrap();
    bed.server.send_direct_message(&alice, "bob", Some("2".into()), None).await.unwrap();
    bed.server.send_direct_message(&carol, "bob", Some("3".into()), None).await.unwrap();

    let (_, mut rx_a) = attach(&bed.server, "alice", Role::Student).await;
    let (_, mut rx_b) = attach(&bed.server, "bob", Role::Student).await;
    drain(&mut rx_a);
    drain(&mut rx_b);

    let flipped = bed.server.mark_thread_read(&bob, "alice").await.unwrap();
    assert_eq!(flipped, 2, "both of alice's messages flip");

    // 双方会话都收到回执 / Both parties' sessions receive the receipt
    for rx in [&mut rx_a, &mut rx_b] {
        let frames = drain(rx);
        let receipt = frames
            .iter()
            .find(|f| f.event_type == "message.threadRead")
            .expect("threadRead receipt");
        assert_eq!(receipt.data["partnerId"], "alice");
        assert_eq!(receipt.data["readerId"], "bob");
    }

    // carol的消息未被触碰 / carol's message untouched
    assert_eq!(bed.messages.mark_thread_read("bob", "carol").await.unwrap(), 1);

    // 幂等：重复调用不再翻转，但仍发回执 / Idempotent: no re-flip, receipt still emitted
    let flipped = bed.server.mark_thread_read(&bob, "alice").await.unwrap();
    assert_eq!(flipped, 0);
    assert_eq!(count_of(&drain(&mut rx_b), "message.threadRead"), 1);

    // 不存在的对端不发回执 / No receipt for a nonexistent partner
    let err = bed.server.mark_thread_read(&bob, "nobody").await.unwrap_err();
    assert!(matches!(err, HubError::NotFound(_)));
    assert!(drain(&mut rx_b).is_empty());
}

#[tokio::test]
async fn removed_member_stops_receiving_group_messages() {
    let bed = test_bed();
    bed.users.seed("sup", "Supervisor", Role::Supervisor, None);
    bed.users.seed("s1", "Student One", Role::Student, Some("sup"));

    let supervisor = ident("sup", Role::Supervisor);
    let group = bed.server.create_group(&supervisor, "cohort").await.unwrap();

    let (_, mut rx_s1) = attach(&bed.server, "s1", Role::Student).await;
    bed.server.add_group_member(&supervisor, &group.id, "s1").await.unwrap();
    drain(&mut rx_s1);

    bed.server
        .send_group_message(&supervisor, &group.id, Some("welcome".into()), None)
        .await
        .unwrap();
    let frames = drain(&mut rx_s1);
    assert_eq!(count_of(&frames, "group.newMessage"), 1);

    bed.server.remove_group_member(&supervisor, &group.id, "s1").await.unwrap();
    let frames = drain(&mut rx_s1);
    assert_eq!(count_of(&frames, "group.removed"), 1, "targeted removal event");
    assert_eq!(count_of(&frames, "group.membersChanged"), 0, "removed user misses membersChanged");

    bed.server
        .send_group_message(&supervisor, &group.id, Some("after".into()), None)
        .await
        .unwrap();
    assert_eq!(count_of(&drain(&mut rx_s1), "group.newMessage"), 0);
}

#[tokio::test]
async fn group_message_reaches_online_member_and_queues_notification_for_offline() {
    let bed = test_bed();
    bed.users.seed("sup", "Supervisor", Role::Supervisor, None);
    bed.users.seed("s1", "Student One", Role::Student, Some("sup"));
    bed.users.seed("s2", "Student Two", Role::Student, Some("sup"));

    let supervisor = ident("sup", Role::Supervisor);
    let group = bed.server.create_group(&supervisor, "cohort").await.unwrap();
    bed.server.add_group_member(&supervisor, &group.id, "s1").await.unwrap();
    bed.server.add_group_member(&supervisor, &group.id, "s2").await.unwrap();

    // S1上线，S2始终离线 / S1 connects, S2 never does
    let (_, mut rx_s1) = attach(&bed.server, "s1", Role::Student).await;
    drain(&mut rx_s1);

    bed.server
        .send_group_message(&supervisor, &group.id, Some("assignment posted".into()), None)
        .await
        .unwrap();

    let frames = drain(&mut rx_s1);
    let group_msg = frames
        .iter()
        .find(|f| f.event_type == "group.newMessage")
        .expect("live group.newMessage for S1");
    assert_eq!(group_msg.data["senderName"], "Supervisor");
    assert_eq!(group_msg.data["groupId"], group.id);

    assert_eq!(bed.notifications.unread_count("s2").await.unwrap(), 1);
    // 发起者不收自己的扇出 / The actor never receives their own fanout
    assert_eq!(bed.notifications.unread_count("sup").await.unwrap(), 0);
}

#[tokio::test]
async fn group_management_authorization_rules() {
    let bed = test_bed();
    bed.users.seed("sup", "Supervisor", Role::Supervisor, None);
    bed.users.seed("other", "Other Supervisor", Role::Supervisor, None);
    bed.users.seed("s1", "Student One", Role::Student, Some("sup"));
    bed.users.seed("outsider", "Outsider", Role::Student, Some("other"));

    let supervisor = ident("sup", Role::Supervisor);

    // 学生不能建群 / A student may not create a group
    let err = bed.server.create_group(&ident("s1", Role::Student), "nope").await.unwrap_err();
    assert!(matches!(err, HubError::Authorization(_)));

    let group = bed.server.create_group(&supervisor, "cohort").await.unwrap();

    // 候选集之外不可添加 / Outside the candidate set is not addable
    let err = bed
        .server
        .add_group_member(&supervisor, &group.id, "outsider")
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::Authorization(_)));

    bed.server.add_group_member(&supervisor, &group.id, "s1").await.unwrap();

    // 非群主不可管理 / Non-owners may not manage
    let err = bed
        .server
        .remove_group_member(&ident("other", Role::Supervisor), &group.id, "s1")
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::Authorization(_)));

    // 群主不可被移除、不可退群 / The owner can neither be removed nor leave
    let err = bed.server.remove_group_member(&supervisor, &group.id, "sup").await.unwrap_err();
    assert!(matches!(err, HubError::Authorization(_)));
    let err = bed.server.leave_group(&supervisor, &group.id).await.unwrap_err();
    assert!(matches!(err, HubError::Authorization(_)));

    // 普通成员可退群 / A regular member may leave
    bed.server.leave_group(&ident("s1", Role::Student), &group.id).await.unwrap();
    assert!(!bed.server.groups.is_member(&group.id, "s1").await.unwrap());
}

#[tokio::test]
async fn group_deletion_notifies_then_tears_down() {
    let bed = test_bed();
    bed.users.seed("sup", "Supervisor", Role::Supervisor, None);
    bed.users.seed("s1", "Student One", Role::Student, Some("sup"));

    let supervisor = ident("sup", Role::Supervisor);
    let group = bed.server.create_group(&supervisor, "cohort").await.unwrap();
    bed.server.add_group_member(&supervisor, &group.id, "s1").await.unwrap();

    let (_, mut rx_s1) = attach(&bed.server, "s1", Role::Student).await;
    drain(&mut rx_s1);

    bed.server.delete_group(&supervisor, &group.id).await.unwrap();
    let frames = drain(&mut rx_s1);
    assert_eq!(count_of(&frames, "group.deleted"), 1);

    // 频道已拆除 / Channel torn down
    let err = bed
        .server
        .send_group_message(&supervisor, &group.id, Some("late".into()), None)
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::NotFound(_)));
}

#[tokio::test]
async fn fanout_to_admins_excludes_actor() {
    let bed = test_bed();
    bed.users.seed("admin1", "Admin One", Role::Admin, None);
    bed.users.seed("admin2", "Admin Two", Role::Admin, None);
    bed.users.seed("s1", "Student One", Role::Student, None);

    let (_, mut rx_admin1) = attach(&bed.server, "admin1", Role::Admin).await;
    drain(&mut rx_admin1);

    let delivered = bed
        .server
        .fan_out(
            "admin2",
            RecipientSet::Admins,
            "activity.flagged",
            "a project needs review",
            serde_json::json!({ "route": "admin" }),
        )
        .await
        .unwrap();
    assert_eq!(delivered, 1, "acting admin excluded from their own fanout");

    let frames = drain(&mut rx_admin1);
    let event = frames
        .iter()
        .find(|f| f.event_type == "notification.new")
        .expect("notification.new for admin1");
    assert_eq!(event.data["type"], "activity.flagged");
    assert!(event.data["id"].is_string(), "emitted row carries the generated id");
    assert_eq!(bed.notifications.unread_count("admin2").await.unwrap(), 0);
}

#[tokio::test]
async fn failed_group_lookup_leaves_no_session_state() {
    let (server, _, _) =
        server_with(Arc::new(FailingGroupStore), Arc::new(RecordingPush::default()));

    let (tx, _rx) = mpsc::unbounded_channel::<Outbound>();
    let conn = Connection {
        conn_id: "conn-u1".to_string(),
        user_id: "u1".to_string(),
        role: Role::Student,
        addr: "127.0.0.1:0".parse().unwrap(),
        sender: tx,
        connected_at: chrono::Utc::now().timestamp_millis(),
        last_heartbeat: Arc::new(parking_lot::Mutex::new(Instant::now())),
    };
    server.join_session(conn).await.unwrap_err();

    // 半加入状态为零：无连接、无订阅、不在线 / Zero half-joined state left behind
    assert!(server.connections.is_empty());
    assert!(server.router.subscribers(&user_channel("u1")).is_empty());
    assert!(!server.presence.is_online("u1"));
}

#[tokio::test]
async fn push_delivery_stays_off_the_response_path() {
    let (server, users, notifications) =
        server_with(Arc::new(MemoryGroupStore::new()), Arc::new(StalledPush));
    users.seed("alice", "Alice", Role::Student, None);
    users.seed("bob", "Bob", Role::Student, None);

    // 卡死的推送源不影响发送方返回 / A wedged push provider never holds up the sender
    let record = tokio::time::timeout(
        std::time::Duration::from_secs(1),
        server.send_direct_message(
            &ident("alice", Role::Student),
            "bob",
            Some("hi".to_string()),
            None,
        ),
    )
    .await
    .expect("send must return without waiting for push")
    .unwrap();

    assert!(!record.is_read);
    assert_eq!(notifications.unread_count("bob").await.unwrap(), 1);
}
