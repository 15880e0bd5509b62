//! Device directory: who is registered, who is online, and which admin has
//! each device open.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use remotefm_protocol::{ConnectionInfo, DeviceStatus};
use tokio::sync::{mpsc, RwLock};

/// Text frames queued for one connection.
pub type Outbox = mpsc::Sender<String>;

/// Relay-unique id of one WebSocket connection.
pub type ConnId = u64;

struct DeviceEntry {
    info: ConnectionInfo,
    /// Live connection, if online.
    link: Option<(ConnId, Outbox)>,
    offline_since: Option<Instant>,
}

#[derive(Default)]
struct Inner {
    devices: HashMap<String, DeviceEntry>,
    admins: HashMap<ConnId, Outbox>,
    /// device id → admin that has it open
    owners: HashMap<String, ConnId>,
}

/// Thread-safe directory shared by every connection handler.
#[derive(Clone, Default)]
pub struct Directory {
    inner: Arc<RwLock<Inner>>,
    next_conn: Arc<AtomicU64>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_conn_id(&self) -> ConnId {
        self.next_conn.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Record a device as online on connection `conn`. Returns the outbox of
    /// the connection it replaces, if the id was already online.
    pub async fn register_device(
        &self,
        conn: ConnId,
        mut info: ConnectionInfo,
        outbox: Outbox,
    ) -> Option<Outbox> {
        info.status = DeviceStatus::Online;
        let mut inner = self.inner.write().await;
        let previous = inner.devices.insert(
            info.id.clone(),
            DeviceEntry {
                info,
                link: Some((conn, outbox)),
                offline_since: None,
            },
        );
        previous.and_then(|entry| entry.link).map(|(_, outbox)| outbox)
    }

    /// Mark a device offline if `conn` is still its live connection.
    /// Returns false when a newer connection has taken over.
    pub async fn device_disconnected(&self, device_id: &str, conn: ConnId) -> bool {
        let mut inner = self.inner.write().await;
        let Some(entry) = inner.devices.get_mut(device_id) else {
            return false;
        };
        if !matches!(entry.link, Some((live, _)) if live == conn) {
            return false;
        }
        entry.link = None;
        entry.info.status = DeviceStatus::Offline;
        entry.offline_since = Some(Instant::now());
        inner.owners.remove(device_id);
        true
    }

    pub async fn add_admin(&self, conn: ConnId, outbox: Outbox) {
        self.inner.write().await.admins.insert(conn, outbox);
    }

    /// Forget an admin and release every device it had open.
    pub async fn remove_admin(&self, conn: ConnId) {
        let mut inner = self.inner.write().await;
        inner.admins.remove(&conn);
        inner.owners.retain(|_, owner| *owner != conn);
    }

    /// Outbox of an online device. The asking admin becomes its owner.
    pub async fn open_device(&self, admin: ConnId, device_id: &str) -> Option<Outbox> {
        let mut inner = self.inner.write().await;
        let outbox = inner
            .devices
            .get(device_id)
            .and_then(|entry| entry.link.as_ref())
            .map(|(_, outbox)| outbox.clone())?;
        inner.owners.insert(device_id.to_string(), admin);
        Some(outbox)
    }

    /// Where replies from `device_id` go: the owning admin, or every admin
    /// when nobody has the device open.
    pub async fn reply_targets(&self, device_id: &str) -> Vec<Outbox> {
        let inner = self.inner.read().await;
        if let Some(outbox) = inner
            .owners
            .get(device_id)
            .and_then(|owner| inner.admins.get(owner))
        {
            return vec![outbox.clone()];
        }
        inner.admins.values().cloned().collect()
    }

    pub async fn admins(&self) -> Vec<Outbox> {
        self.inner.read().await.admins.values().cloned().collect()
    }

    /// Every known device, sorted by id.
    pub async fn snapshot(&self) -> Vec<ConnectionInfo> {
        let inner = self.inner.read().await;
        let mut devices: Vec<ConnectionInfo> =
            inner.devices.values().map(|entry| entry.info.clone()).collect();
        devices.sort_by(|a, b| a.id.cmp(&b.id));
        devices
    }

    /// Drop devices that have been offline for longer than `ttl`.
    pub async fn reap_offline(&self, ttl: Duration) -> usize {
        let mut inner = self.inner.write().await;
        let now = Instant::now();
        let before = inner.devices.len();
        inner.devices.retain(|id, entry| {
            let stale = entry
                .offline_since
                .is_some_and(|since| now.duration_since(since) > ttl);
            if stale {
                tracing::info!(device = %id, "Reaping offline device");
            }
            !stale
        });
        before - inner.devices.len()
    }

    /// `(online devices, known devices, admins)`
    pub async fn counts(&self) -> (usize, usize, usize) {
        let inner = self.inner.read().await;
        let online = inner.devices.values().filter(|e| e.link.is_some()).count();
        (online, inner.devices.len(), inner.admins.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(id: &str) -> ConnectionInfo {
        ConnectionInfo {
            id: id.into(),
            device_name: format!("{id} phone"),
            ip: "10.0.0.1".into(),
            android_version: "14".into(),
            connected_at: "2026-10-18 12:00:00".into(),
            status: DeviceStatus::Offline,
        }
    }

    fn outbox() -> (Outbox, mpsc::Receiver<String>) {
        mpsc::channel(8)
    }

    #[tokio::test]
    async fn register_then_disconnect() {
        let dir = Directory::new();
        let (tx, _rx) = outbox();
        let conn = dir.next_conn_id();

        assert!(dir.register_device(conn, info("a"), tx).await.is_none());
        let snapshot = dir.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].status, DeviceStatus::Online);

        assert!(dir.device_disconnected("a", conn).await);
        assert_eq!(dir.snapshot().await[0].status, DeviceStatus::Offline);
        assert_eq!(dir.counts().await, (0, 1, 0));
    }

    #[tokio::test]
    async fn reregistration_replaces_the_old_connection() {
        let dir = Directory::new();
        let (old_tx, _old_rx) = outbox();
        let (new_tx, _new_rx) = outbox();
        let old = dir.next_conn_id();
        let new = dir.next_conn_id();

        dir.register_device(old, info("a"), old_tx).await;
        assert!(dir.register_device(new, info("a"), new_tx).await.is_some());

        // The superseded connection closing must not take the device offline.
        assert!(!dir.device_disconnected("a", old).await);
        assert_eq!(dir.snapshot().await[0].status, DeviceStatus::Online);
        assert!(dir.device_disconnected("a", new).await);
    }

    #[tokio::test]
    async fn snapshot_is_sorted_and_keeps_offline_devices() {
        let dir = Directory::new();
        for id in ["c", "a", "b"] {
            let (tx, _rx) = outbox();
            let conn = dir.next_conn_id();
            dir.register_device(conn, info(id), tx).await;
            if id == "b" {
                dir.device_disconnected("b", conn).await;
            }
        }
        let snapshot = dir.snapshot().await;
        let ids: Vec<&str> = snapshot.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(snapshot[1].status, DeviceStatus::Offline);
    }

    #[tokio::test]
    async fn opening_a_device_routes_its_replies_to_that_admin() {
        let dir = Directory::new();
        let (device_tx, _device_rx) = outbox();
        let (admin1_tx, mut admin1_rx) = outbox();
        let (admin2_tx, mut admin2_rx) = outbox();
        let (admin1, admin2) = (dir.next_conn_id(), dir.next_conn_id());
        dir.add_admin(admin1, admin1_tx).await;
        dir.add_admin(admin2, admin2_tx).await;
        dir.register_device(dir.next_conn_id(), info("a"), device_tx).await;

        // Unowned: every admin hears replies.
        assert_eq!(dir.reply_targets("a").await.len(), 2);

        assert!(dir.open_device(admin2, "a").await.is_some());
        let targets = dir.reply_targets("a").await;
        assert_eq!(targets.len(), 1);
        targets[0].send("hello".into()).await.unwrap();
        assert_eq!(admin2_rx.recv().await.as_deref(), Some("hello"));
        assert!(admin1_rx.try_recv().is_err());

        // Admin leaving releases the device.
        dir.remove_admin(admin2).await;
        assert_eq!(dir.reply_targets("a").await.len(), 1);
        assert_eq!(dir.counts().await.2, 1);
    }

    #[tokio::test]
    async fn offline_or_unknown_devices_cannot_be_opened() {
        let dir = Directory::new();
        let (tx, _rx) = outbox();
        let conn = dir.next_conn_id();
        dir.register_device(conn, info("a"), tx).await;
        dir.device_disconnected("a", conn).await;

        assert!(dir.open_device(1, "a").await.is_none());
        assert!(dir.open_device(1, "ghost").await.is_none());
    }

    #[tokio::test]
    async fn reaper_drops_only_stale_offline_devices() {
        let dir = Directory::new();
        let (a_tx, _a_rx) = outbox();
        let (b_tx, _b_rx) = outbox();
        let a = dir.next_conn_id();
        dir.register_device(a, info("a"), a_tx).await;
        dir.register_device(dir.next_conn_id(), info("b"), b_tx).await;
        dir.device_disconnected("a", a).await;

        assert_eq!(dir.reap_offline(Duration::from_secs(60)).await, 0);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(dir.reap_offline(Duration::from_millis(10)).await, 1);

        let snapshot = dir.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "b");
    }
}
