//! Channel registry keyed by channel id.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use sigrelay_core::error::{Result, SigRelayError};

use crate::realtime::Connection;
use crate::signaling::channel::Channel;

/// A channel and its creation time.
#[derive(Clone)]
pub struct ChannelRecord {
    pub when: Instant,
    pub channel: Arc<Channel>,
}

impl ChannelRecord {
    pub fn new(channel: Arc<Channel>) -> Self {
        Self {
            when: channel.created(),
            channel,
        }
    }
}

/// Process-wide channel map. All operations are non-blocking and in-memory.
#[derive(Default)]
pub struct ChannelRegistry {
    channels: DashMap<String, ChannelRecord>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<Channel>> {
        self.channels.get(id).map(|r| Arc::clone(&r.value().channel))
    }

    /// Add `user_id` to the channel for `id`, constructing the channel with
    /// `factory` if absent.
    ///
    /// Lookup, construction and the membership insert all happen while the
    /// entry is locked: racing callers for the same id see exactly one
    /// construction, and `purge_idle` never observes the channel empty
    /// between lookup and join. The factory must not touch the registry.
    pub fn join_or_create<F>(&self, id: &str, user_id: &str, conn: &Connection, factory: F) -> Result<Arc<Channel>>
    where
        F: FnOnce() -> Result<Channel>,
    {
        match self.channels.entry(id.to_string()) {
            Entry::Occupied(e) => {
                let channel = Arc::clone(&e.get().channel);
                channel.add(user_id, conn)?;
                Ok(channel)
            }
            Entry::Vacant(e) => {
                let channel = factory().map_err(|err| {
                    tracing::error!(channel = %id, error = %err, "failed to create channel");
                    SigRelayError::Internal(format!("channel upsert without result: {err}"))
                })?;
                channel.add(user_id, conn)?;
                let channel = Arc::new(channel);
                e.insert(ChannelRecord::new(Arc::clone(&channel)));
                Ok(channel)
            }
        }
    }

    /// Add `user_id` to an existing channel, holding the entry lock across
    /// the insert so a concurrent purge cannot orphan the new member.
    pub fn join(&self, id: &str, user_id: &str, conn: &Connection) -> Result<Arc<Channel>> {
        let record = self
            .channels
            .get(id)
            .ok_or_else(|| SigRelayError::bad("channel not found"))?;
        record.channel.add(user_id, conn)?;
        Ok(Arc::clone(&record.channel))
    }

    /// Insert `record` unless `id` is taken. Returns whether it was inserted.
    pub fn set_if_absent(&self, id: &str, record: ChannelRecord) -> bool {
        match self.channels.entry(id.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(e) => {
                e.insert(record);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Drop `user_id` from every channel where it is still mapped to `conn`.
    pub fn remove_connection(&self, user_id: &str, conn: &Connection) -> usize {
        let channels: Vec<Arc<Channel>> = self
            .channels
            .iter()
            .map(|r| Arc::clone(&r.value().channel))
            .collect();
        channels
            .iter()
            .filter(|ch| ch.remove_connection(user_id, conn))
            .count()
    }

    /// Housekeeping: forget channels that are empty and older than `max_age`.
    pub fn purge_idle(&self, max_age: Duration) -> usize {
        let before = self.channels.len();
        self.channels
            .retain(|_, r| !(r.channel.is_empty() && r.when.elapsed() >= max_age));
        before.saturating_sub(self.channels.len())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    use axum::extract::ws::Message;
    use sigrelay_core::signaling::HashAuthenticator;
    use tokio::sync::mpsc;

    fn auth() -> Arc<HashAuthenticator> {
        Arc::new(HashAuthenticator::from_key(&[3u8; 32]).unwrap())
    }

    fn conn(sid: &str, user: &str) -> Connection {
        let (tx, _rx) = mpsc::channel::<Message>(1);
        Connection::bound(sid, user, tx)
    }

    #[test]
    fn concurrent_join_or_create_builds_once() {
        const N: usize = 16;
        let reg = Arc::new(ChannelRegistry::new());
        let built = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(N));
        let a = auth();

        let handles: Vec<_> = (0..N)
            .map(|i| {
                let reg = Arc::clone(&reg);
                let built = Arc::clone(&built);
                let barrier = Arc::clone(&barrier);
                let a = Arc::clone(&a);
                std::thread::spawn(move || {
                    let user = format!("u{i}");
                    let c = conn(&format!("s{i}"), &user);
                    barrier.wait();
                    reg.join_or_create("g-race", &user, &c, || {
                        built.fetch_add(1, Ordering::SeqCst);
                        Ok(Channel::group("g-race", "race", None, a))
                    })
                    .unwrap()
                })
            })
            .collect();

        let got: Vec<Arc<Channel>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert!(got.iter().all(|c| Arc::ptr_eq(c, &got[0])));
        assert_eq!(got[0].members().len(), N);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn failed_factory_is_internal_and_leaves_no_entry() {
        let reg = ChannelRegistry::new();
        let err = reg
            .join_or_create("g-x", "alice", &conn("s1", "alice"), || {
                Err(SigRelayError::Internal("boom".into()))
            })
            .err()
            .unwrap();
        assert_eq!(err.client_code().as_str(), "internal_error");
        assert!(reg.get("g-x").is_none());
    }

    #[test]
    fn old_empty_channel_survives_purge_once_joined() {
        let reg = ChannelRegistry::new();
        let a = auth();
        let alice = conn("s1", "alice");
        let first = reg
            .join_or_create("g-x", "alice", &alice, || Ok(Channel::group("g-x", "x", None, Arc::clone(&a))))
            .unwrap();
        first.remove("alice");
        std::thread::sleep(Duration::from_millis(5));

        let joined = reg
            .join_or_create("g-x", "alice", &alice, || Ok(Channel::group("g-x", "x", None, Arc::clone(&a))))
            .unwrap();
        assert_eq!(reg.purge_idle(Duration::from_millis(1)), 0);

        let current = reg.get("g-x").unwrap();
        assert!(Arc::ptr_eq(&current, &joined));
        assert!(Arc::ptr_eq(&current, &first));
        assert!(current.contains("alice"));
    }

    #[test]
    fn concurrent_purge_never_orphans_a_joiner() {
        let reg = Arc::new(ChannelRegistry::new());
        let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let sweeper = {
            let reg = Arc::clone(&reg);
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    reg.purge_idle(Duration::ZERO);
                }
            })
        };

        let a = auth();
        let alice = conn("s1", "alice");
        for _ in 0..2000 {
            let ch = reg
                .join_or_create("g-x", "alice", &alice, || Ok(Channel::group("g-x", "x", None, Arc::clone(&a))))
                .unwrap();
            let live = reg.get("g-x").expect("joined channel must stay registered");
            assert!(Arc::ptr_eq(&live, &ch));
            assert!(live.contains("alice"));
            ch.remove("alice");
        }

        stop.store(true, Ordering::Relaxed);
        sweeper.join().unwrap();
    }

    #[test]
    fn join_requires_existing_channel() {
        let reg = ChannelRegistry::new();
        let bob = conn("s2", "bob");
        let err = reg.join("c-none", "bob", &bob).unwrap_err();
        assert_eq!(err.client_code().as_str(), "bad_message");

        reg.set_if_absent("c-1", ChannelRecord::new(Arc::new(Channel::call("c-1", auth()))));
        let ch = reg.join("c-1", "bob", &bob).unwrap();
        assert!(ch.contains("bob"));
    }

    #[test]
    fn set_if_absent_keeps_first() {
        let reg = ChannelRegistry::new();
        let first = Arc::new(Channel::call("c-1", auth()));
        assert!(reg.set_if_absent("c-1", ChannelRecord::new(Arc::clone(&first))));
        assert!(!reg.set_if_absent("c-1", ChannelRecord::new(Arc::new(Channel::call("c-1", auth())))));
        assert!(Arc::ptr_eq(&reg.get("c-1").unwrap(), &first));
    }

    #[test]
    fn purge_only_drops_empty_channels() {
        let reg = ChannelRegistry::new();
        let busy = Arc::new(Channel::call("c-busy", auth()));
        busy.add("alice", &conn("s1", "alice")).unwrap();
        reg.set_if_absent("c-busy", ChannelRecord::new(busy));
        reg.set_if_absent("c-idle", ChannelRecord::new(Arc::new(Channel::call("c-idle", auth()))));

        assert_eq!(reg.purge_idle(Duration::ZERO), 1);
        assert!(reg.get("c-busy").is_some());
        assert!(reg.get("c-idle").is_none());
    }
}
