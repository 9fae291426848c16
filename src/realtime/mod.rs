//! Realtime voice sessions (SDP offer/answer + control side channel).

pub mod broker;
pub mod config;
pub mod events;
pub mod peer;
pub mod session;

pub use broker::{CredentialBroker, HttpCredentialBroker};
pub use config::RealtimeConfiguration;
pub use events::{ClientEvent, ServerEvent};
pub use peer::{
    AudioConstraints, AudioPlayback, ChannelEvent, ControlChannel, MediaStream, PeerConnection,
    RemoteTrackHandler, RtcPlatform, SdpKind, SessionDescription,
};
pub use session::{RealtimeSession, SessionHandlers, SessionState};
