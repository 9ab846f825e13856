//! The per-connection state machine (spec.md §4.9): four-phase dispatch,
//! framing glue, online-mode key exchange, and the per-connection write
//! lock.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::RngCore;
use uuid::Uuid;

use crate::codec;
use crate::config::Config;
use crate::crypto::{compute_session_hash, offline_uuid, Cfb8Decryptor, Cfb8Encryptor, KeyPair};
use crate::error::{Result, ServerError};
use crate::identity;
use crate::play;
use crate::player::{PacketSink, Player, PlayerManager, Position};
use crate::protocol::packets::{handshake, login, play as play_packets, status};
use crate::transport::{read_frame, write_frame};
use crate::world::WorldStore;

/// Shared, process-wide collaborators every connection needs. One instance
/// is built at startup and cloned (cheaply, via `Arc`) into each accepted
/// connection's thread.
pub struct Shared {
    pub config: Config,
    pub world: Arc<WorldStore>,
    pub players: Arc<PlayerManager>,
    pub key_pair: Option<Arc<KeyPair>>,
    pub http: reqwest::blocking::Client,
    pub commands: Arc<play::commands::CommandTable>,
}

/// Reads/writes raw bytes, applying the AES-CFB8 stream cipher once
/// installed (spec.md §4.4, §4.9 "install the AES-CFB8 stream on the
/// socket").
struct CipherStream {
    inner: TcpStream,
    encryptor: Option<Cfb8Encryptor>,
    decryptor: Option<Cfb8Decryptor>,
}

impl CipherStream {
    fn new(inner: TcpStream) -> Self {
        CipherStream {
            inner,
            encryptor: None,
            decryptor: None,
        }
    }

    /// Installs the read-side half of the encrypted session (spec.md §4.9).
    fn install_decryptor(&mut self, shared_secret: &[u8; 16]) {
        self.decryptor = Some(Cfb8Decryptor::new(shared_secret));
    }

    /// Installs the write-side half of the encrypted session (spec.md
    /// §4.9). Must be installed on exactly one `CipherStream` per
    /// connection — the one behind `ConnectionSink`'s mutex — so every
    /// encrypted clientbound byte, from `LoginSuccess` through the rest of
    /// the play phase, advances the same keystream register.
    fn install_encryptor(&mut self, shared_secret: &[u8; 16]) {
        self.encryptor = Some(Cfb8Encryptor::new(shared_secret));
    }

    fn try_clone(&self) -> std::io::Result<TcpStream> {
        self.inner.try_clone()
    }
}

impl Read for CipherStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        if let Some(decryptor) = &mut self.decryptor {
            decryptor.decrypt(&mut buf[..n]);
        }
        Ok(n)
    }
}

impl Write for CipherStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.encryptor {
            Some(encryptor) => {
                let mut owned = buf.to_vec();
                encryptor.encrypt(&mut owned);
                self.inner.write_all(&owned)?;
                Ok(buf.len())
            }
            None => self.inner.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// The write half the rest of the server sees: one mutex-guarded stream per
/// connection, implementing `PacketSink` so play handlers and the player
/// manager can address this connection without knowing about framing or
/// encryption (spec.md §4.9 "per-connection write lock").
pub struct ConnectionSink {
    writer: Mutex<CipherStream>,
    cancel: Arc<AtomicBool>,
}

impl PacketSink for ConnectionSink {
    fn send_packet(&self, packet_id: i32, payload: &[u8]) -> Result<()> {
        if self.cancel.load(Ordering::Acquire) {
            return Err(ServerError::IoCanceled);
        }
        let mut writer = self.writer.lock();
        write_frame(packet_id, payload, &mut *writer)
    }
}

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);
const KEEP_ALIVE_TIMEOUT: Duration = Duration::from_secs(30);

struct KeepAlive {
    last_sent_id: AtomicI64,
    last_sent_at: Mutex<Instant>,
    last_acked_id: AtomicI64,
}

/// Drives one accepted connection end to end.
pub struct Connection {
    shared: Arc<Shared>,
    stream: CipherStream,
    sink: Arc<ConnectionSink>,
    cancel: Arc<AtomicBool>,
}

impl Connection {
    #[must_use]
    pub fn new(shared: Arc<Shared>, stream: TcpStream) -> Self {
        let cancel = Arc::new(AtomicBool::new(false));
        let cipher_stream = CipherStream::new(stream);
        let sink = Arc::new(ConnectionSink {
            writer: Mutex::new(CipherStream::new(cipher_stream.try_clone().unwrap())),
            cancel: Arc::clone(&cancel),
        });
        Connection {
            shared,
            stream: cipher_stream,
            sink,
            cancel,
        }
    }

    /// Runs the handshake -> status|login -> play dispatch. Any error
    /// terminates the connection; the caller logs it.
    pub fn run(mut self) -> Result<()> {
        let next_state = self.handshake()?;
        match next_state {
            1 => self.status(),
            2 => {
                let player = self.login()?;
                self.play(player)
            }
            other => Err(ServerError::ProtocolError(format!(
                "unknown handshake next_state {other}"
            ))),
        }
    }

    fn handshake(&mut self) -> Result<i32> {
        let frame = read_frame(&mut self.stream)?;
        if frame.id != handshake::Handshake::ID {
            return Err(ServerError::ProtocolError(format!(
                "expected Handshake, got id {}",
                frame.id
            )));
        }
        let mut cursor = std::io::Cursor::new(frame.payload);
        let packet = handshake::Handshake::decode(&mut cursor)?;
        Ok(packet.next_state)
    }

    fn status(&mut self) -> Result<()> {
        loop {
            let frame = read_frame(&mut self.stream)?;
            let mut cursor = std::io::Cursor::new(frame.payload);
            match frame.id {
                status::serverbound::Request::ID => {
                    let _ = status::serverbound::Request::decode(&mut cursor)?;
                    let json = serde_json::json!({
                        "version": { "name": "1.8.9", "protocol": 47 },
                        "players": {
                            "max": self.shared.config.max_players,
                            "online": self.shared.players.count() as u32,
                        },
                        "description": { "text": self.shared.config.motd },
                    })
                    .to_string();
                    self.write_unframed(status::clientbound::Response { json })?;
                }
                status::serverbound::Ping::ID => {
                    let ping = status::serverbound::Ping::decode(&mut cursor)?;
                    self.write_unframed(status::clientbound::Pong {
                        payload: ping.payload,
                    })?;
                    return Ok(());
                }
                other => {
                    return Err(ServerError::ProtocolError(format!(
                        "unexpected status packet id {other}"
                    )))
                }
            }
        }
    }

    /// Runs the login phase and returns the joined player's identity,
    /// ready for `play()` (spec.md §4.9 "login").
    fn login(&mut self) -> Result<Arc<Player>> {
        let frame = read_frame(&mut self.stream)?;
        if frame.id != login::serverbound::LoginStart::ID {
            return Err(ServerError::ProtocolError(format!(
                "expected LoginStart, got id {}",
                frame.id
            )));
        }
        let mut cursor = std::io::Cursor::new(frame.payload);
        let login_start = login::serverbound::LoginStart::decode(&mut cursor)?;
        let username = login_start.username;

        let (uuid, skin_properties) = if self.shared.config.online_mode {
            self.online_mode_handshake(&username)?
        } else {
            (offline_uuid(&username), Vec::new())
        };

        self.write_unframed(login::clientbound::LoginSuccess {
            uuid: uuid.hyphenated().to_string(),
            username: username.clone(),
        })?;

        let entity_id = self.shared.players.allocate_entity_id();
        let mut player = Player::new(entity_id, uuid, username, self.sink.clone());
        player.skin_properties = skin_properties;
        Ok(Arc::new(player))
    }

    fn online_mode_handshake(
        &mut self,
        username: &str,
    ) -> Result<(Uuid, Vec<crate::player::SkinProperty>)> {
        let key_pair = self
            .shared
            .key_pair
            .clone()
            .ok_or_else(|| ServerError::AuthFailed("online mode requires a key pair".to_string()))?;

        let mut verify_token = [0u8; 4];
        rand::rngs::OsRng.fill_bytes(&mut verify_token);

        self.write_unframed(login::clientbound::EncryptionRequest {
            server_id: String::new(),
            public_key: key_pair.public_key_der().to_vec(),
            verify_token: verify_token.to_vec(),
        })?;

        let frame = read_frame(&mut self.stream)?;
        if frame.id != login::serverbound::EncryptionResponse::ID {
            return Err(ServerError::ProtocolError(format!(
                "expected EncryptionResponse, got id {}",
                frame.id
            )));
        }
        let mut cursor = std::io::Cursor::new(frame.payload);
        let response = login::serverbound::EncryptionResponse::decode(&mut cursor)?;

        let decrypted_token = key_pair
            .decrypt(&response.verify_token)
            .map_err(|e| ServerError::AuthFailed(format!("verify token decrypt failed: {e}")))?;
        if decrypted_token != verify_token {
            return Err(ServerError::AuthFailed("verify token mismatch".to_string()));
        }

        let shared_secret_vec = key_pair
            .decrypt(&response.shared_secret)
            .map_err(|e| ServerError::AuthFailed(format!("shared secret decrypt failed: {e}")))?;
        let shared_secret: [u8; 16] = shared_secret_vec
            .try_into()
            .map_err(|_| ServerError::AuthFailed("shared secret was not 16 bytes".to_string()))?;

        // One encryptor, shared via `self.sink`: `write_unframed` routes
        // through it too, so `LoginSuccess` and every play-phase packet
        // advance the same register (see `write_unframed` below).
        self.stream.install_decryptor(&shared_secret);
        self.sink.writer.lock().install_encryptor(&shared_secret);

        let session_hash = compute_session_hash("", &shared_secret, key_pair.public_key_der());
        let identity = identity::has_joined(&self.shared.http, username, &session_hash)?;
        Ok((identity.uuid, identity.properties))
    }

    fn play(mut self, player: Arc<Player>) -> Result<()> {
        play::join::join(&self.shared, &player)?;
        self.shared.players.add(Arc::clone(&player));

        let keep_alive = Arc::new(KeepAlive {
            last_sent_id: AtomicI64::new(0),
            last_sent_at: Mutex::new(Instant::now()),
            last_acked_id: AtomicI64::new(0),
        });
        self.spawn_keep_alive_thread(Arc::clone(&keep_alive), Arc::clone(&player));

        let result = self.read_loop(&player, &keep_alive);
        self.cancel.store(true, Ordering::Release);
        self.shared.players.remove(player.entity_id);
        save_player(&self.shared, &player);
        result
    }

    fn spawn_keep_alive_thread(&self, keep_alive: Arc<KeepAlive>, player: Arc<Player>) {
        let cancel = Arc::clone(&self.cancel);
        std::thread::spawn(move || loop {
            std::thread::sleep(KEEP_ALIVE_INTERVAL);
            if cancel.load(Ordering::Acquire) {
                return;
            }
            let outstanding = keep_alive.last_sent_id.load(Ordering::Acquire)
                != keep_alive.last_acked_id.load(Ordering::Acquire);
            if outstanding && keep_alive.last_sent_at.lock().elapsed() >= KEEP_ALIVE_TIMEOUT {
                let _ = player.sink.send_packet(
                    play_packets::clientbound::Disconnect::ID,
                    &encode(&play_packets::clientbound::Disconnect {
                        reason: r#"{"text":"Timed out"}"#.to_string(),
                    }),
                );
                cancel.store(true, Ordering::Release);
                return;
            }
            let next_id = keep_alive.last_sent_id.fetch_add(1, Ordering::AcqRel) + 1;
            *keep_alive.last_sent_at.lock() = Instant::now();
            player.send(
                play_packets::clientbound::KeepAlive::ID,
                &encode(&play_packets::clientbound::KeepAlive {
                    keep_alive_id: next_id as i32,
                }),
            );
        });
    }

    fn read_loop(&mut self, player: &Arc<Player>, keep_alive: &Arc<KeepAlive>) -> Result<()> {
        loop {
            let frame = match read_frame(&mut self.stream) {
                Ok(frame) => frame,
                Err(ServerError::IoCanceled) => return Ok(()),
                Err(e) => return Err(e),
            };
            if self.cancel.load(Ordering::Acquire) {
                return Ok(());
            }
            if frame.id == play_packets::serverbound::KeepAlive::ID {
                let mut cursor = std::io::Cursor::new(frame.payload);
                if let Ok(packet) = play_packets::serverbound::KeepAlive::decode(&mut cursor) {
                    keep_alive_ack(keep_alive)(packet.keep_alive_id as i64);
                }
                continue;
            }
            play::dispatch(&self.shared, player, frame)?;
        }
    }

    /// Writes one unframed (login/status-phase) packet through the same
    /// `ConnectionSink` the play phase uses, so it shares that sink's single
    /// encryptor register instead of advancing an independent one.
    fn write_unframed<P: WirePacket>(&mut self, packet: P) -> Result<()> {
        let payload = encode(&packet);
        self.sink.send_packet(P::ID, &payload)
    }
}

/// Persists one player's position, game mode, and inventory on disconnect
/// (spec.md §4.11 "save on shutdown"). Logged, not propagated — a failed
/// save must not stop the connection from tearing down.
fn save_player(shared: &Shared, player: &Player) {
    let result = crate::persist::player_save::save(
        &shared.config.data_dir,
        &player.uuid,
        &player.username,
        &player.position(),
        player.game_mode(),
        &player.inventory.read(),
    );
    if let Err(err) = result {
        log::warn!("failed to save player {}: {err}", player.username);
    }
}

fn keep_alive_ack(keep_alive: &Arc<KeepAlive>) -> impl Fn(i64) + '_ {
    move |id: i64| {
        if id == keep_alive.last_sent_id.load(Ordering::Acquire) {
            keep_alive.last_acked_id.store(id, Ordering::Release);
        }
    }
}

/// A packet struct generated by `packet!`, encodable to a byte buffer.
pub trait WirePacket {
    const ID: i32;
    fn encode_bytes(&self) -> Vec<u8>;
}

macro_rules! impl_wire_packet {
    ($($ty:path),* $(,)?) => {
        $(impl WirePacket for $ty {
            const ID: i32 = <$ty>::ID;
            fn encode_bytes(&self) -> Vec<u8> {
                let mut buf = Vec::new();
                self.encode(&mut buf).expect("encoding to a Vec<u8> cannot fail");
                buf
            }
        })*
    };
}

impl_wire_packet!(
    status::clientbound::Response,
    status::clientbound::Pong,
    login::clientbound::LoginSuccess,
    login::clientbound::EncryptionRequest,
    login::clientbound::Disconnect,
    play_packets::clientbound::Disconnect,
    play_packets::clientbound::KeepAlive,
    play_packets::clientbound::JoinGame,
    play_packets::clientbound::SpawnPosition,
    play_packets::clientbound::PlayerAbilities,
    play_packets::clientbound::PlayerPositionLook,
    play_packets::clientbound::TimeUpdate,
    play_packets::clientbound::WindowItems,
    play_packets::clientbound::ChatMessage,
    play_packets::clientbound::TabComplete,
);

pub(crate) fn encode<P: WirePacket>(packet: &P) -> Vec<u8> {
    packet.encode_bytes()
}

impl std::fmt::Debug for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
