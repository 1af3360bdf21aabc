//! Command processing system.
//!
//! Processes commands pushed by the host onto the `RaceCommandQueue`.

use bevy::prelude::*;

use crate::bevy::{
    ActiveRace, AudioCueMessage, LatestTick, RaceCommand, RaceCommandQueue, RaceEventMessage,
    RaceSettings,
};
use crate::hud::TickOutput;
use crate::session::RaceSession;

/// Forwards a tick's events and cues as messages.
pub(crate) fn publish(
    output: &TickOutput,
    events: &mut MessageWriter<RaceEventMessage>,
    cues: &mut MessageWriter<AudioCueMessage>,
) {
    for event in &output.events {
        events.write(RaceEventMessage(event.clone()));
    }
    for cue in &output.audio {
        cues.write(AudioCueMessage(*cue));
    }
}

/// Stops the running session, if any, and publishes its final output.
fn stop_active(
    race: &mut ActiveRace,
    latest: &mut LatestTick,
    events: &mut MessageWriter<RaceEventMessage>,
    cues: &mut MessageWriter<AudioCueMessage>,
) {
    if let Some(mut session) = race.0.take() {
        let output = session.stop();
        publish(&output, events, cues);
        latest.0 = Some(output);
    }
}

/// System to process all commands from the external command queue.
pub fn process_commands(
    command_queue: Res<RaceCommandQueue>,
    time: Res<Time<Fixed>>,
    mut settings: ResMut<RaceSettings>,
    mut race: ResMut<ActiveRace>,
    mut latest: ResMut<LatestTick>,
    mut events: MessageWriter<RaceEventMessage>,
    mut cues: MessageWriter<AudioCueMessage>,
) {
    for command in command_queue.drain() {
        match command {
            RaceCommand::StartOffline {
                track,
                car_index,
                difficulty,
            } => {
                tracing::info!("[command] StartOffline on {}", track.name);
                stop_active(&mut race, &mut latest, &mut events, &mut cues);
                race.0 = Some(RaceSession::offline(
                    track,
                    car_index,
                    difficulty,
                    settings.config.clone(),
                ));
            }
            RaceCommand::StartOnline {
                track,
                car_index,
                room,
                inbox,
                transport,
            } => {
                tracing::info!(
                    "[command] StartOnline in room {} ({} members)",
                    room.room_id,
                    room.roster.len()
                );
                stop_active(&mut race, &mut latest, &mut events, &mut cues);
                race.0 = Some(RaceSession::online(
                    track,
                    car_index,
                    settings.config.clone(),
                    room,
                    inbox,
                    transport,
                ));
            }
            RaceCommand::TogglePause => {
                if let Some(session) = race.0.as_mut() {
                    let paused = session.toggle_pause(time.elapsed());
                    tracing::info!("[command] TogglePause (paused={paused})");
                }
            }
            RaceCommand::Restart => {
                let fresh = race.0.as_mut().and_then(RaceSession::restart);
                match fresh {
                    Some(session) => {
                        tracing::info!("[command] Restart");
                        stop_active(&mut race, &mut latest, &mut events, &mut cues);
                        race.0 = Some(session);
                    }
                    None => tracing::warn!("[command] Restart ignored: no offline race running"),
                }
            }
            RaceCommand::Stop => {
                tracing::info!("[command] Stop");
                stop_active(&mut race, &mut latest, &mut events, &mut cues);
            }
            RaceCommand::SetBindings(bindings) => {
                tracing::info!("[command] SetBindings");
                settings.bindings = bindings;
            }
        }
    }
}
