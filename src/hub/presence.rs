use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// 在线状态注册表 / Presence registry
///
/// 每个身份一个原子计数，在线当且仅当计数大于0；状态跃迁只在0→1和1→0可见。
/// 计数只允许通过connect/disconnect钩子变更。
/// One atomic counter per identity; online iff count > 0; transitions observable
/// only at 0→1 and 1→0. Counts mutate exclusively through the connect/disconnect hooks.
#[derive(Default)]
pub struct PresenceRegistry {
    counts: DashMap<String, usize>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 连接登记，返回是否发生0→1跃迁 / Register a connection; true on the 0→1 transition
    pub fn connect(&self, user_id: &str) -> bool {
        let mut entry = self.counts.entry(user_id.to_string()).or_insert(0);
        *entry += 1;
        *entry == 1
    }

    /// 断开登记，返回是否发生1→0跃迁 / Register a disconnect; true on the 1→0 transition
    ///
    /// 每次连接关闭都会走到这里，无论关闭原因 / Runs on every connection close regardless of cause
    pub fn disconnect(&self, user_id: &str) -> bool {
        match self.counts.entry(user_id.to_string()) {
            Entry::Occupied(mut occupied) => {
                let count = occupied.get_mut();
                *count = count.saturating_sub(1);
                if *count == 0 {
                    occupied.remove();
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(_) => false,
        }
    }

    pub fn is_online(&self, user_id: &str) -> bool {
        self.counts.get(user_id).map(|c| *c > 0).unwrap_or(false)
    }

    pub fn session_count(&self, user_id: &str) -> usize {
        self.counts.get(user_id).map(|c| *c).unwrap_or(0)
    }

    /// 当前在线用户快照 / Snapshot of currently online users
    pub fn online_user_ids(&self) -> Vec<String> {
        self.counts.iter().map(|e| e.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn transitions_only_at_boundaries() {
        let presence = PresenceRegistry::new();
        assert!(presence.connect("u1"), "0→1 must report online transition");
        assert!(!presence.connect("u1"), "second session must not re-announce");
        assert_eq!(presence.session_count("u1"), 2);

        assert!(!presence.disconnect("u1"), "1 session remains, no offline");
        assert!(presence.is_online("u1"));
        assert!(presence.disconnect("u1"), "1→0 must report offline transition");
        assert!(!presence.is_online("u1"));
        assert_eq!(presence.session_count("u1"), 0);
    }

    #[test]
    fn disconnect_never_goes_negative() {
        let presence = PresenceRegistry::new();
        assert!(!presence.disconnect("ghost"));
        assert_eq!(presence.session_count("ghost"), 0);
        presence.connect("u1");
        presence.disconnect("u1");
        assert!(!presence.disconnect("u1"));
        assert_eq!(presence.session_count("u1"), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_sessions_count_exactly() {
        let presence = Arc::new(PresenceRegistry::new());
        let mut handles = Vec::new();
        for _ in 0..32 {
            let p = presence.clone();
            handles.push(tokio::spawn(async move { p.connect("u1") }));
        }
        let mut online_transitions = 0;
        for h in handles {
            if h.await.unwrap() {
                online_transitions += 1;
            }
        }
        assert_eq!(online_transitions, 1, "exactly one 0→1 transition");
        assert_eq!(presence.session_count("u1"), 32);

        let mut handles = Vec::new();
        for _ in 0..32 {
            let p = presence.clone();
            handles.push(tokio::spawn(async move { p.disconnect("u1") }));
        }
        let mut offline_transitions = 0;
        for h in handles {
            if h.await.unwrap() {
                offline_transitions += 1;
            }
        }
        assert_eq!(offline_transitions, 1, "exactly one 1→0 transition");
        assert!(!presence.is_online("u1"));
    }
}
