//! Platform seams for the realtime transport.
//!
//! The negotiator owns sequencing, state, the HTTP handshake, and event
//! dispatch; the media/ICE mechanics live behind these traits so a native
//! backend (or a test double) can supply them.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;

/// An SDP session description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    pub kind: SdpKind,
    pub sdp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpKind {
    Offer,
    Answer,
}

/// Capture constraints for the local microphone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for AudioConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

/// Lifecycle events of a control channel, delivered in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Open,
    Message(String),
    Closed,
}

/// Source of peer connections, capture streams, and audio playback.
#[async_trait]
pub trait RtcPlatform: Send + Sync {
    /// Capture a local audio stream.
    async fn capture_audio(&self, constraints: &AudioConstraints) -> Result<Box<dyn MediaStream>>;

    /// Create an unconnected peer connection.
    fn new_peer_connection(&self) -> Result<Box<dyn PeerConnection>>;

    /// The local playback sink for remote audio.
    fn audio_playback(&self) -> std::sync::Arc<dyn AudioPlayback>;
}

/// A live media stream holding one or more tracks.
pub trait MediaStream: Send {
    /// Stable identifier, used when attaching the stream to a peer.
    fn id(&self) -> &str;

    /// Stop every track. Must be idempotent.
    fn stop_tracks(&mut self);
}

/// Plays a remote media stream locally.
pub trait AudioPlayback: Send + Sync {
    fn attach(&self, stream: Box<dyn MediaStream>);
}

/// Handler invoked when the remote peer adds a media track.
pub type RemoteTrackHandler = Box<dyn Fn(Box<dyn MediaStream>) + Send + Sync>;

/// A peer connection collaborator.
#[async_trait]
pub trait PeerConnection: Send {
    fn on_remote_track(&mut self, handler: RemoteTrackHandler);

    fn add_track(&mut self, stream: &dyn MediaStream) -> Result<()>;

    /// Create an ordered, reliable bidirectional data channel.
    fn create_data_channel(&mut self, label: &str) -> Result<Box<dyn ControlChannel>>;

    async fn create_offer(&mut self) -> Result<SessionDescription>;

    async fn set_local_description(&mut self, desc: &SessionDescription) -> Result<()>;

    async fn set_remote_description(&mut self, desc: &SessionDescription) -> Result<()>;

    /// Close the connection. Must be idempotent.
    fn close(&mut self);
}

/// The control side channel of a peer connection.
pub trait ControlChannel: Send {
    /// Take the channel's ordered event receiver. Yields `Open`, then
    /// `Message`s, then `Closed`. Returns `None` if already taken.
    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<ChannelEvent>>;

    fn send(&self, payload: &str) -> Result<()>;

    fn is_open(&self) -> bool;

    /// Close the channel. Must be idempotent.
    fn close(&mut self);
}
