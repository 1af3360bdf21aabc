//! Race tick systems.

use bevy::prelude::*;

use crate::bevy::systems::command::publish;
use crate::bevy::{
    ActiveRace, AudioCueMessage, JustPressed, LatestTick, RaceEventMessage, RaceSettings,
};

/// Advances the active session by one tick. Runs in `FixedUpdate`, so
/// `Time` is the fixed clock and its elapsed time is the race's `now`.
pub fn advance_race(
    time: Res<Time>,
    keys: Option<Res<ButtonInput<KeyCode>>>,
    settings: Res<RaceSettings>,
    mut race: ResMut<ActiveRace>,
    mut latest: ResMut<LatestTick>,
    mut events: MessageWriter<RaceEventMessage>,
    mut cues: MessageWriter<AudioCueMessage>,
) {
    let Some(session) = race.0.as_mut() else {
        return;
    };
    let input = keys
        .as_deref()
        .map(|keys| settings.bindings.sample(keys))
        .unwrap_or_default();
    let output = session.tick(&input, time.elapsed());
    publish(&output, &mut events, &mut cues);
    latest.0 = Some(output);
}

/// Toggles pause on the pause key's rising edge.
pub fn handle_pause_key(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    time: Res<Time<Fixed>>,
    settings: Res<RaceSettings>,
    mut race: ResMut<ActiveRace>,
) {
    let (Some(keys), Some(session)) = (keys, race.0.as_mut()) else {
        return;
    };
    if settings.bindings.pause_pressed(&JustPressed(&*keys)) {
        session.toggle_pause(time.elapsed());
    }
}
