//! Audio notifications
//!
//! The simulation reports sounds as `SoundEffect`s; an `AudioNotifier`
//! turns them into noise. Notifiers are fire-and-forget and must never fail
//! back into the caller. On wasm, `WebAudio` synthesizes every effect with
//! oscillators, no sample files needed.

use serde::{Deserialize, Serialize};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Local player fired
    Shoot,
    /// An enemy died
    EnemyDeath,
    /// Local player took damage
    PlayerDamage,
}

/// Fire-and-forget audio sink
pub trait AudioNotifier {
    fn notify_shoot(&mut self);
    fn notify_enemy_death(&mut self);
    fn notify_player_damage(&mut self);

    /// Dispatch a sound produced by the simulation step
    fn play(&mut self, effect: SoundEffect) {
        match effect {
            SoundEffect::Shoot => self.notify_shoot(),
            SoundEffect::EnemyDeath => self.notify_enemy_death(),
            SoundEffect::PlayerDamage => self.notify_player_damage(),
        }
    }
}

/// Silent notifier for headless runs
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioNotifier for NullAudio {
    fn notify_shoot(&mut self) {}
    fn notify_enemy_death(&mut self) {}
    fn notify_player_damage(&mut self) {}
}

/// Effective gain from the volume settings
pub fn effective_volume(master: f32, sfx: f32, muted: bool) -> f32 {
    if muted {
        0.0
    } else {
        master.clamp(0.0, 1.0) * sfx.clamp(0.0, 1.0)
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

#[cfg(target_arch = "wasm32")]
mod web {
    use super::{AudioNotifier, SoundEffect, effective_volume};
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    /// Web Audio backend
    pub struct WebAudio {
        ctx: Option<AudioContext>,
        master_volume: f32,
        sfx_volume: f32,
        muted: bool,
    }

    impl Default for WebAudio {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WebAudio {
        pub fn new() -> Self {
            // Fails outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                master_volume: 0.8,
                sfx_volume: 1.0,
                muted: false,
            }
        }

        pub fn set_volumes(&mut self, master: f32, sfx: f32, muted: bool) {
            self.master_volume = master.clamp(0.0, 1.0);
            self.sfx_volume = sfx.clamp(0.0, 1.0);
            self.muted = muted;
        }

        fn emit(&self, effect: SoundEffect) {
            let vol = effective_volume(self.master_volume, self.sfx_volume, self.muted);
            if vol <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match effect {
                SoundEffect::Shoot => play_shot(ctx, vol),
                SoundEffect::EnemyDeath => play_enemy_pop(ctx, vol),
                SoundEffect::PlayerDamage => play_damage(ctx, vol),
            }
        }
    }

    impl AudioNotifier for WebAudio {
        fn notify_shoot(&mut self) {
            self.emit(SoundEffect::Shoot);
        }

        fn notify_enemy_death(&mut self) {
            self.emit(SoundEffect::EnemyDeath);
        }

        fn notify_player_damage(&mut self) {
            self.emit(SoundEffect::PlayerDamage);
        }
    }

    /// Create an oscillator routed through a gain node
    fn create_osc(
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Short square-wave crack with a falling pitch
    fn play_shot(ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = create_osc(ctx, 880.0, OscillatorType::Square) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.2, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.08)
            .ok();
        osc.frequency().set_value_at_time(880.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(220.0, t + 0.08)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.1).ok();
    }

    /// Rising chirp plus a low thump
    fn play_enemy_pop(ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();

        if let Some((osc, gain)) = create_osc(ctx, 300.0, OscillatorType::Triangle) {
            gain.gain().set_value_at_time(vol * 0.3, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.15)
                .ok();
            osc.frequency().set_value_at_time(300.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(1200.0, t + 0.1)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.18).ok();
        }

        if let Some((osc, gain)) = create_osc(ctx, 80.0, OscillatorType::Sine) {
            gain.gain().set_value_at_time(vol * 0.4, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.12)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.15).ok();
        }
    }

    /// Low sawtooth buzz
    fn play_damage(ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = create_osc(ctx, 120.0, OscillatorType::Sawtooth) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.35, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.2)
            .ok();
        osc.frequency().set_value_at_time(120.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(50.0, t + 0.2)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.22).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Tally(Vec<&'static str>);

    impl AudioNotifier for Tally {
        fn notify_shoot(&mut self) {
            self.0.push("shoot");
        }
        fn notify_enemy_death(&mut self) {
            self.0.push("death");
        }
        fn notify_player_damage(&mut self) {
            self.0.push("damage");
        }
    }

    #[test]
    fn test_play_dispatches_to_notifier() {
        let mut tally = Tally::default();
        tally.play(SoundEffect::Shoot);
        tally.play(SoundEffect::PlayerDamage);
        tally.play(SoundEffect::EnemyDeath);
        assert_eq!(tally.0, vec!["shoot", "damage", "death"]);
    }

    #[test]
    fn test_effective_volume() {
        assert_eq!(effective_volume(0.5, 0.5, false), 0.25);
        assert_eq!(effective_volume(1.0, 1.0, true), 0.0);
        assert_eq!(effective_volume(2.0, 1.0, false), 1.0);
    }
}
