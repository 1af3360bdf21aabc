//! Sound cues emitted by the simulation and the sink that plays them.

use serde::{Deserialize, Serialize};

/// Oscillator shape for synthesized tones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// Engine drone parameters for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSound {
    pub speed: f32,
    pub max_speed: f32,
    pub accelerating: bool,
}

impl EngineSound {
    /// Oscillator frequency in Hz: idle rumble plus speed, with a bump
    /// while the throttle is held.
    pub fn pitch(&self) -> f32 {
        let ratio = if self.max_speed > 0.0 {
            self.speed.abs() / self.max_speed
        } else {
            0.0
        };
        let load = if self.accelerating { 50.0 } else { 0.0 };
        40.0 + ratio * 130.0 + load
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cue", rename_all = "snake_case")]
pub enum AudioCue {
    /// Wake the audio context and start the engine drone.
    Init,
    Tone {
        frequency: f32,
        waveform: Waveform,
        duration: f32,
        volume: f32,
    },
    Boost,
    Finish,
    Engine(EngineSound),
    StopEngine,
}

impl AudioCue {
    /// Beep for the 3, 2, 1 countdown steps.
    pub fn countdown_beep() -> Self {
        AudioCue::Tone {
            frequency: 440.0,
            waveform: Waveform::Sine,
            duration: 0.1,
            volume: 0.1,
        }
    }

    /// Higher, longer tone when the lights go green.
    pub fn go_tone() -> Self {
        AudioCue::Tone {
            frequency: 880.0,
            waveform: Waveform::Sine,
            duration: 0.3,
            volume: 0.15,
        }
    }
}

/// Whatever actually makes noise. All calls are fire-and-forget.
pub trait AudioSink {
    fn init(&mut self) {}
    fn play_tone(&mut self, frequency: f32, waveform: Waveform, duration: f32, volume: f32);
    fn play_boost(&mut self);
    fn play_finish(&mut self);
    fn update_engine(&mut self, speed: f32, max_speed: f32, accelerating: bool);
    fn stop_engine(&mut self);
}

/// Sink for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play_tone(&mut self, _: f32, _: Waveform, _: f32, _: f32) {}
    fn play_boost(&mut self) {}
    fn play_finish(&mut self) {}
    fn update_engine(&mut self, _: f32, _: f32, _: bool) {}
    fn stop_engine(&mut self) {}
}

/// Forwards a tick's cues to a sink in order.
pub fn dispatch(sink: &mut dyn AudioSink, cues: &[AudioCue]) {
    for cue in cues {
        match *cue {
            AudioCue::Init => sink.init(),
            AudioCue::Tone {
                frequency,
                waveform,
                duration,
                volume,
            } => sink.play_tone(frequency, waveform, duration, volume),
            AudioCue::Boost => sink.play_boost(),
            AudioCue::Finish => sink.play_finish(),
            AudioCue::Engine(engine) => {
                sink.update_engine(engine.speed, engine.max_speed, engine.accelerating);
            }
            AudioCue::StopEngine => sink.stop_engine(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl AudioSink for Recorder {
        fn init(&mut self) {
            self.0.push("init".into());
        }
        fn play_tone(&mut self, frequency: f32, _: Waveform, _: f32, _: f32) {
            self.0.push(format!("tone {frequency}"));
        }
        fn play_boost(&mut self) {
            self.0.push("boost".into());
        }
        fn play_finish(&mut self) {
            self.0.push("finish".into());
        }
        fn update_engine(&mut self, _: f32, _: f32, accelerating: bool) {
            self.0.push(format!("engine {accelerating}"));
        }
        fn stop_engine(&mut self) {
            self.0.push("stop".into());
        }
    }

    #[test]
    fn test_dispatch_in_order() {
        let mut sink = Recorder::default();
        dispatch(
            &mut sink,
            &[
                AudioCue::Init,
                AudioCue::countdown_beep(),
                AudioCue::go_tone(),
                AudioCue::Engine(EngineSound {
                    speed: 1.0,
                    max_speed: 3.52,
                    accelerating: true,
                }),
                AudioCue::Boost,
                AudioCue::Finish,
                AudioCue::StopEngine,
            ],
        );
        assert_eq!(
            sink.0,
            vec!["init", "tone 440", "tone 880", "engine true", "boost", "finish", "stop"]
        );
    }

    #[test]
    fn test_engine_pitch() {
        let idle = EngineSound {
            speed: 0.0,
            max_speed: 2.0,
            accelerating: false,
        };
        assert!((idle.pitch() - 40.0).abs() < f32::EPSILON);
        let flat_out = EngineSound {
            speed: -2.0,
            max_speed: 2.0,
            accelerating: true,
        };
        assert!((flat_out.pitch() - 220.0).abs() < 1e-4);
    }
}
