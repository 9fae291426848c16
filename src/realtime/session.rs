//! Realtime session negotiation and lifecycle.

use std::sync::{Arc, Mutex};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{KafiError, Result};
use crate::http::shared_client;

use super::broker::CredentialBroker;
use super::config::RealtimeConfiguration;
use super::events::{ClientEvent, ServerEvent};
use super::peer::{
    ChannelEvent, ControlChannel, MediaStream, PeerConnection, RtcPlatform, SdpKind,
    SessionDescription,
};

/// Lifecycle of one realtime session.
///
/// `Closed` is terminal: a session is single-use and a new instance is
/// required to reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Negotiating,
    Open,
    Closed,
}

/// Callbacks the session reports through. All default to no-ops.
pub struct SessionHandlers {
    on_message: Box<dyn Fn(ServerEvent) + Send + Sync>,
    on_connection_change: Box<dyn Fn(bool) + Send + Sync>,
    on_speaking_change: Box<dyn Fn(bool) + Send + Sync>,
}

impl Default for SessionHandlers {
    fn default() -> Self {
        Self {
            on_message: Box::new(|_| {}),
            on_connection_change: Box::new(|_| {}),
            on_speaking_change: Box::new(|_| {}),
        }
    }
}

impl SessionHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once per control event received from the remote peer.
    pub fn on_message(mut self, f: impl Fn(ServerEvent) + Send + Sync + 'static) -> Self {
        self.on_message = Box::new(f);
        self
    }

    /// Called when the side channel opens or closes.
    pub fn on_connection_change(mut self, f: impl Fn(bool) + Send + Sync + 'static) -> Self {
        self.on_connection_change = Box::new(f);
        self
    }

    /// Called when the assistant starts or stops producing audio.
    pub fn on_speaking_change(mut self, f: impl Fn(bool) + Send + Sync + 'static) -> Self {
        self.on_speaking_change = Box::new(f);
        self
    }
}

/// Negotiates and owns one full-duplex realtime session: local microphone
/// in, remote audio out, and a JSON control channel in both directions.
pub struct RealtimeSession {
    config: RealtimeConfiguration,
    broker: Arc<dyn CredentialBroker>,
    platform: Arc<dyn RtcPlatform>,
    handlers: Arc<SessionHandlers>,
    state: Arc<Mutex<SessionState>>,
    peer: Option<Box<dyn PeerConnection>>,
    local_stream: Option<Box<dyn MediaStream>>,
    channel: Option<Box<dyn ControlChannel>>,
    dispatch: Option<JoinHandle<()>>,
}

impl RealtimeSession {
    pub fn new(
        config: RealtimeConfiguration,
        broker: Arc<dyn CredentialBroker>,
        platform: Arc<dyn RtcPlatform>,
        handlers: SessionHandlers,
    ) -> Self {
        Self {
            config,
            broker,
            platform,
            handlers: Arc::new(handlers),
            state: Arc::new(Mutex::new(SessionState::Idle)),
            peer: None,
            local_stream: None,
            channel: None,
            dispatch: None,
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap()
    }

    /// Establish the session: credential, microphone, peer connection,
    /// control channel, then the SDP offer/answer handshake.
    ///
    /// Any failure tears down everything acquired so far before the error
    /// is returned. A session that has left `Idle` cannot be initialized
    /// again.
    pub async fn init(&mut self) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap();
            if *state != SessionState::Idle {
                return Err(KafiError::InvalidState(format!(
                    "cannot negotiate from {state:?}"
                )));
            }
            *state = SessionState::Negotiating;
        }

        match self.negotiate().await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(%err, "negotiation failed, tearing down");
                self.disconnect();
                Err(err)
            }
        }
    }

    async fn negotiate(&mut self) -> Result<()> {
        let ephemeral_key = self.broker.mint().await?;

        let local = self
            .platform
            .capture_audio(&self.config.constraints)
            .await?;
        debug!(stream = local.id(), "captured local audio");
        self.local_stream = Some(local);

        // Stored before the fallible steps below so a failed negotiation
        // still closes it during teardown.
        let peer = self.peer.insert(self.platform.new_peer_connection()?);

        let playback = self.platform.audio_playback();
        peer.on_remote_track(Box::new(move |remote| playback.attach(remote)));

        if let Some(stream) = self.local_stream.as_deref() {
            peer.add_track(stream)?;
        }

        let mut channel = peer.create_data_channel(&self.config.channel_label)?;
        let events = channel
            .take_events()
            .ok_or_else(|| KafiError::Peer("control channel events already taken".into()))?;
        self.dispatch = Some(Self::spawn_dispatch(
            events,
            Arc::clone(&self.state),
            Arc::clone(&self.handlers),
        ));
        self.channel = Some(channel);

        let offer = peer.create_offer().await?;
        peer.set_local_description(&offer).await?;

        let answer_sdp = post_offer(&self.config, &ephemeral_key, &offer.sdp).await?;
        peer.set_remote_description(&SessionDescription {
            kind: SdpKind::Answer,
            sdp: answer_sdp,
        })
        .await?;

        debug!("realtime handshake complete");
        Ok(())
    }

    /// Inject a synthetic user turn and ask the peer for a response.
    ///
    /// Precondition: the control channel is open. Calling earlier (or
    /// after closure) is an `InvalidState` error, never a queued send.
    pub fn send_text_message(&self, text: &str) -> Result<()> {
        let channel = self
            .channel
            .as_ref()
            .filter(|c| c.is_open())
            .ok_or_else(|| KafiError::InvalidState("control channel is not open".into()))?;

        channel.send(&ClientEvent::user_message(text).to_json())?;
        channel.send(&ClientEvent::CreateResponse.to_json())?;
        Ok(())
    }

    /// Tear down the session. Idempotent and callable in any state;
    /// resources never acquired are skipped. Always reports
    /// disconnected/not-speaking.
    pub fn disconnect(&mut self) {
        debug!("disconnecting realtime session");
        self.teardown();
        *self.state.lock().unwrap() = SessionState::Closed;
        (self.handlers.on_connection_change)(false);
        (self.handlers.on_speaking_change)(false);
    }

    fn teardown(&mut self) {
        if let Some(task) = self.dispatch.take() {
            task.abort();
        }
        if let Some(mut stream) = self.local_stream.take() {
            stream.stop_tracks();
        }
        if let Some(mut channel) = self.channel.take() {
            channel.close();
        }
        if let Some(mut peer) = self.peer.take() {
            peer.close();
        }
    }

    fn spawn_dispatch(
        mut events: mpsc::UnboundedReceiver<ChannelEvent>,
        state: Arc<Mutex<SessionState>>,
        handlers: Arc<SessionHandlers>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    ChannelEvent::Open => {
                        debug!("control channel open");
                        *state.lock().unwrap() = SessionState::Open;
                        (handlers.on_connection_change)(true);
                    }
                    ChannelEvent::Closed => {
                        debug!("control channel closed");
                        *state.lock().unwrap() = SessionState::Closed;
                        (handlers.on_connection_change)(false);
                        break;
                    }
                    ChannelEvent::Message(raw) => {
                        let event = match ServerEvent::parse(&raw) {
                            Ok(event) => event,
                            Err(err) => {
                                warn!(%err, "dropping undecodable control event");
                                continue;
                            }
                        };
                        let speaking = match &event {
                            ServerEvent::AudioDelta => Some(true),
                            ServerEvent::AudioDone | ServerEvent::ResponseDone => Some(false),
                            _ => None,
                        };
                        (handlers.on_message)(event);
                        if let Some(speaking) = speaking {
                            (handlers.on_speaking_change)(speaking);
                        }
                    }
                }
            }
        })
    }
}

impl Drop for RealtimeSession {
    fn drop(&mut self) {
        // Release transport resources; callbacks only fire on explicit
        // disconnect.
        self.teardown();
    }
}

/// POST the local offer to the realtime endpoint and return the answer SDP.
async fn post_offer(
    config: &RealtimeConfiguration,
    ephemeral_key: &str,
    offer_sdp: &str,
) -> Result<String> {
    let url = format!("{}?model={}", config.base_url, config.model);
    debug!(%url, "posting SDP offer");

    let resp = shared_client()
        .post(&url)
        .header(AUTHORIZATION, format!("Bearer {ephemeral_key}"))
        .header(CONTENT_TYPE, "application/sdp")
        .body(offer_sdp.to_string())
        .send()
        .await?;

    let status = resp.status().as_u16();
    if !(200..300).contains(&status) {
        return Err(KafiError::api(status, "realtime handshake rejected"));
    }

    Ok(resp.text().await?)
}
