//! Shared test doubles: a scripted RTC platform and callback recorders.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use kafi::error::{KafiError, Result};
use kafi::realtime::{
    AudioConstraints, AudioPlayback, ChannelEvent, ControlChannel, CredentialBroker, MediaStream,
    PeerConnection, RemoteTrackHandler, RtcPlatform, SessionDescription, SdpKind, ServerEvent,
};

/// Everything the mock platform observed, shared with the test body.
#[derive(Default)]
pub struct RtcLedger {
    pub streams_captured: AtomicUsize,
    pub tracks_stopped: AtomicUsize,
    pub peers_created: AtomicUsize,
    pub peers_closed: AtomicUsize,
    pub channels_closed: AtomicUsize,
    pub playback_attached: AtomicUsize,
    pub captured_constraints: Mutex<Vec<AudioConstraints>>,
    pub added_tracks: Mutex<Vec<String>>,
    pub channel_labels: Mutex<Vec<String>>,
    pub local_descriptions: Mutex<Vec<SessionDescription>>,
    pub remote_descriptions: Mutex<Vec<SessionDescription>>,
    pub sent_payloads: Mutex<Vec<String>>,
    pub remote_track_handler: Mutex<Option<RemoteTrackHandler>>,
    pub channel: Mutex<Option<ChannelHandle>>,
}

/// The test's remote control for the fake data channel.
pub struct ChannelHandle {
    pub tx: mpsc::UnboundedSender<ChannelEvent>,
    pub open: Arc<AtomicBool>,
}

impl ChannelHandle {
    /// Mark the channel open and deliver the open event.
    pub fn open_channel(&self) {
        self.open.store(true, Ordering::SeqCst);
        let _ = self.tx.send(ChannelEvent::Open);
    }

    pub fn send_message(&self, raw: &str) {
        let _ = self.tx.send(ChannelEvent::Message(raw.to_string()));
    }

    pub fn close_channel(&self) {
        self.open.store(false, Ordering::SeqCst);
        let _ = self.tx.send(ChannelEvent::Closed);
    }
}

/// Scripted platform: records every call, optionally fails capture.
pub struct MockRtc {
    pub ledger: Arc<RtcLedger>,
    pub fail_capture: AtomicBool,
    playback: Arc<MockPlayback>,
}

impl MockRtc {
    pub fn new() -> Self {
        let ledger = Arc::new(RtcLedger::default());
        Self {
            playback: Arc::new(MockPlayback {
                ledger: Arc::clone(&ledger),
            }),
            ledger,
            fail_capture: AtomicBool::new(false),
        }
    }

    pub fn channel_handle(&self) -> ChannelHandle {
        let guard = self.ledger.channel.lock().unwrap();
        let handle = guard.as_ref().expect("data channel not created");
        ChannelHandle {
            tx: handle.tx.clone(),
            open: Arc::clone(&handle.open),
        }
    }
}

#[async_trait]
impl RtcPlatform for MockRtc {
    async fn capture_audio(&self, constraints: &AudioConstraints) -> Result<Box<dyn MediaStream>> {
        if self.fail_capture.load(Ordering::SeqCst) {
            return Err(KafiError::Media("microphone permission denied".into()));
        }
        self.ledger.streams_captured.fetch_add(1, Ordering::SeqCst);
        self.ledger
            .captured_constraints
            .lock()
            .unwrap()
            .push(constraints.clone());
        Ok(Box::new(MockStream {
            id: "mock-mic".to_string(),
            ledger: Arc::clone(&self.ledger),
            stopped: false,
        }))
    }

    fn new_peer_connection(&self) -> Result<Box<dyn PeerConnection>> {
        self.ledger.peers_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockPeer {
            ledger: Arc::clone(&self.ledger),
        }))
    }

    fn audio_playback(&self) -> Arc<dyn AudioPlayback> {
        Arc::clone(&self.playback) as Arc<dyn AudioPlayback>
    }
}

pub struct MockStream {
    id: String,
    ledger: Arc<RtcLedger>,
    stopped: bool,
}

impl MediaStream for MockStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn stop_tracks(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.ledger.tracks_stopped.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// A bare remote stream for driving the remote-track handler.
pub struct RemoteStream {
    id: String,
}

impl RemoteStream {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }
}

impl MediaStream for RemoteStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn stop_tracks(&mut self) {}
}

struct MockPlayback {
    ledger: Arc<RtcLedger>,
}

impl AudioPlayback for MockPlayback {
    fn attach(&self, _stream: Box<dyn MediaStream>) {
        self.ledger.playback_attached.fetch_add(1, Ordering::SeqCst);
    }
}

struct MockPeer {
    ledger: Arc<RtcLedger>,
}

#[async_trait]
impl PeerConnection for MockPeer {
    fn on_remote_track(&mut self, handler: RemoteTrackHandler) {
        *self.ledger.remote_track_handler.lock().unwrap() = Some(handler);
    }

    fn add_track(&mut self, stream: &dyn MediaStream) -> Result<()> {
        self.ledger
            .added_tracks
            .lock()
            .unwrap()
            .push(stream.id().to_string());
        Ok(())
    }

    fn create_data_channel(&mut self, label: &str) -> Result<Box<dyn ControlChannel>> {
        self.ledger
            .channel_labels
            .lock()
            .unwrap()
            .push(label.to_string());
        let (tx, rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(false));
        *self.ledger.channel.lock().unwrap() = Some(ChannelHandle {
            tx,
            open: Arc::clone(&open),
        });
        Ok(Box::new(MockChannel {
            ledger: Arc::clone(&self.ledger),
            events: Some(rx),
            open,
            closed: false,
        }))
    }

    async fn create_offer(&mut self) -> Result<SessionDescription> {
        Ok(SessionDescription {
            kind: SdpKind::Offer,
            sdp: "v=0 mock-offer".to_string(),
        })
    }

    async fn set_local_description(&mut self, desc: &SessionDescription) -> Result<()> {
        self.ledger
            .local_descriptions
            .lock()
            .unwrap()
            .push(desc.clone());
        Ok(())
    }

    async fn set_remote_description(&mut self, desc: &SessionDescription) -> Result<()> {
        self.ledger
            .remote_descriptions
            .lock()
            .unwrap()
            .push(desc.clone());
        Ok(())
    }

    fn close(&mut self) {
        self.ledger.peers_closed.fetch_add(1, Ordering::SeqCst);
    }
}

struct MockChannel {
    ledger: Arc<RtcLedger>,
    events: Option<mpsc::UnboundedReceiver<ChannelEvent>>,
    open: Arc<AtomicBool>,
    closed: bool,
}

impl ControlChannel for MockChannel {
    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<ChannelEvent>> {
        self.events.take()
    }

    fn send(&self, payload: &str) -> Result<()> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(KafiError::InvalidState("channel closed".into()));
        }
        self.ledger
            .sent_payloads
            .lock()
            .unwrap()
            .push(payload.to_string());
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.open.store(false, Ordering::SeqCst);
            self.ledger.channels_closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Broker double returning a fixed secret or a scripted failure.
pub struct StaticBroker {
    pub secret: Option<String>,
    pub mints: AtomicUsize,
}

impl StaticBroker {
    pub fn ok(secret: &str) -> Self {
        Self {
            secret: Some(secret.to_string()),
            mints: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            secret: None,
            mints: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CredentialBroker for StaticBroker {
    async fn mint(&self) -> Result<String> {
        self.mints.fetch_add(1, Ordering::SeqCst);
        self.secret
            .clone()
            .ok_or_else(|| KafiError::Credential("broker unavailable".into()))
    }
}

/// Records every callback the session fires.
#[derive(Default)]
pub struct CallbackRecorder {
    pub connection: Mutex<Vec<bool>>,
    pub speaking: Mutex<Vec<bool>>,
    pub messages: Mutex<Vec<ServerEvent>>,
}

impl CallbackRecorder {
    pub fn connection_events(&self) -> Vec<bool> {
        self.connection.lock().unwrap().clone()
    }

    pub fn speaking_events(&self) -> Vec<bool> {
        self.speaking.lock().unwrap().clone()
    }

    pub fn message_types(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.event_type().to_string())
            .collect()
    }
}

/// Poll until `cond` holds or the deadline passes.
pub async fn wait_until<F: Fn() -> bool>(cond: F) {
    let deadline = tokio::time::Instant::now() + tokio::time::Duration::from_secs(2);
    while !cond() {
        if tokio::time::Instant::now() > deadline {
            panic!("condition not reached within deadline");
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
    }
}
