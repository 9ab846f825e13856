//! The packet catalog (spec.md §4.5): one `packet!` block per
//! `(phase, direction)` pair. Packets whose schema the tag vocabulary can't
//! fully express (variable-shape entity metadata, player-info lists, chunk
//! data payloads, the clicked-slot echo) carry a trailing `rest` field; the
//! handlers in `crate::play` parse those tails manually (spec.md §4.5, §9).

use crate::packet;

pub mod handshake {
    use super::*;

    packet!(Handshake, 0x00, {
        protocol_version: varint,
        server_address: string,
        server_port: u16,
        next_state: varint,
    });
}

pub mod status {
    use super::*;

    pub mod serverbound {
        use super::*;
        packet!(Request, 0x00, {});
        packet!(Ping, 0x01, { payload: i64 });
    }

    pub mod clientbound {
        use super::*;
        packet!(Response, 0x00, { json: string });
        packet!(Pong, 0x01, { payload: i64 });
    }
}

pub mod login {
    use super::*;

    pub mod serverbound {
        use super::*;
        packet!(LoginStart, 0x00, { username: string });
        packet!(EncryptionResponse, 0x01, {
            shared_secret: bytearray,
            verify_token: bytearray,
        });
    }

    pub mod clientbound {
        use super::*;
        packet!(Disconnect, 0x00, { reason: string });
        packet!(EncryptionRequest, 0x01, {
            server_id: string,
            public_key: bytearray,
            verify_token: bytearray,
        });
        // UUID is sent hyphenated-and-dashed as a string, not raw bytes, in
        // protocol 47 (spec.md §8 scenario 1's expected format).
        packet!(LoginSuccess, 0x02, { uuid: string, username: string });
    }
}

pub mod play {
    use super::*;

    pub mod clientbound {
        use super::*;

        packet!(KeepAlive, 0x00, { keep_alive_id: varint });
        packet!(JoinGame, 0x01, {
            entity_id: i32,
            gamemode: u8,
            dimension: i8,
            difficulty: u8,
            max_players: u8,
            level_type: string,
            reduced_debug_info: bool,
        });
        packet!(ChatMessage, 0x02, { json: string, position: i8 });
        packet!(TimeUpdate, 0x03, { world_age: i64, time_of_day: i64 });
        packet!(EntityEquipment, 0x04, {
            entity_id: varint,
            slot: i16,
            item: rest,
        });
        packet!(SpawnPosition, 0x05, { location: position });
        packet!(PlayerPositionLook, 0x08, {
            x: f64,
            y: f64,
            z: f64,
            yaw: f32,
            pitch: f32,
            flags: u8,
        });
        packet!(SpawnPlayer, 0x0C, {
            entity_id: varint,
            uuid: string,
            x: i32,
            y: i32,
            z: i32,
            yaw: i8,
            pitch: i8,
            current_item: i16,
            metadata: rest,
        });
        packet!(CollectItem, 0x0D, {
            collected_entity_id: varint,
            collector_entity_id: varint,
        });
        packet!(SpawnObject, 0x0E, {
            entity_id: varint,
            kind: i8,
            x: i32,
            y: i32,
            z: i32,
            pitch: i8,
            yaw: i8,
            data: i32,
            speed_x: i16,
            speed_y: i16,
            speed_z: i16,
        });
        packet!(EntityRelativeMove, 0x15, {
            entity_id: varint,
            dx: i8,
            dy: i8,
            dz: i8,
            on_ground: bool,
        });
        packet!(EntityLookAndRelativeMove, 0x16, {
            entity_id: varint,
            dx: i8,
            dy: i8,
            dz: i8,
            yaw: i8,
            pitch: i8,
            on_ground: bool,
        });
        packet!(EntityTeleport, 0x18, {
            entity_id: varint,
            x: i32,
            y: i32,
            z: i32,
            yaw: i8,
            pitch: i8,
            on_ground: bool,
        });
        packet!(EntityHeadLook, 0x19, { entity_id: varint, head_yaw: i8 });
        packet!(EntityMetadata, 0x1C, { entity_id: varint, metadata: rest });
        packet!(DestroyEntities, 0x13, { entity_ids: rest });
        packet!(ChunkData, 0x21, {
            chunk_x: i32,
            chunk_z: i32,
            ground_up_continuous: bool,
            primary_bitmask: u16,
            data: bytearray,
        });
        packet!(BlockChange, 0x23, { location: position, block_state: varint });
        packet!(BlockBreakAnimation, 0x25, {
            entity_id: varint,
            location: position,
            destroy_stage: i8,
        });
        packet!(WorldEvent, 0x28, {
            effect_id: i32,
            location: position,
            data: i32,
            disable_relative_volume: bool,
        });
        packet!(SetSlot, 0x2F, { window_id: i8, slot: i16, slot_data: rest });
        packet!(WindowItems, 0x30, { window_id: u8, slots: rest });
        packet!(ConfirmTransaction, 0x32, {
            window_id: i8,
            action_number: i16,
            accepted: bool,
        });
        packet!(PlayerListItem, 0x37, { action: varint, entries: rest });
        packet!(PlayerAbilities, 0x38, {
            flags: i8,
            flying_speed: f32,
            walking_speed: f32,
        });
        packet!(TabComplete, 0x3A, { matches: rest });
        packet!(Disconnect, 0x40, { reason: string });
    }

    pub mod serverbound {
        use super::*;

        packet!(KeepAlive, 0x00, { keep_alive_id: varint });
        packet!(ChatMessage, 0x01, { message: string });
        packet!(PlayerPosition, 0x04, { x: f64, y: f64, z: f64, on_ground: bool });
        packet!(PlayerLook, 0x05, { yaw: f32, pitch: f32, on_ground: bool });
        packet!(PlayerPositionAndLook, 0x06, {
            x: f64,
            y: f64,
            z: f64,
            yaw: f32,
            pitch: f32,
            on_ground: bool,
        });
        packet!(PlayerDigging, 0x07, { status: i8, location: position, face: i8 });
        // Held-item slot data and cursor offsets follow `face` with a shape
        // the tag vocabulary can't express (an optional slot payload); the
        // handler parses `tail` directly (spec.md §9).
        packet!(PlayerBlockPlacement, 0x08, { location: position, face: i8, tail: rest });
        packet!(CloseWindow, 0x0D, { window_id: u8 });
        packet!(ClickWindow, 0x0E, {
            window_id: u8,
            slot: i16,
            button: i8,
            action_number: i16,
            mode: i8,
            clicked_slot: rest,
        });
        packet!(TabComplete, 0x14, { text: string, tail: rest });
    }
}
