//! ADSR envelope generator.

/// Envelope stages.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// ADSR envelope with linear attack/decay/release segments.
///
/// Stage lengths are converted to sample counts when a stage is entered,
/// so parameter changes take effect at the next gate or stage transition.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Attack time in seconds.
    pub attack: f32,
    /// Decay time in seconds.
    pub decay: f32,
    /// Sustain level [0, 1].
    pub sustain: f32,
    /// Release time in seconds.
    pub release: f32,

    stage: Stage,
    level: f32,
    sample_rate: f32,
    /// Samples remaining in the current stage.
    stage_samples: usize,
    stage_counter: usize,
    /// Level at the start of the current stage (for retrigger/release).
    start_level: f32,
}

impl Envelope {
    pub fn new(sample_rate: f32) -> Self {
        Envelope {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.8,
            release: 0.3,
            stage: Stage::Idle,
            level: 0.0,
            sample_rate,
            stage_samples: 0,
            stage_counter: 0,
            start_level: 0.0,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Update the ADSR times and sustain level.
    pub fn set_params(&mut self, attack: f32, decay: f32, sustain: f32, release: f32) {
        self.attack = attack;
        self.decay = decay;
        self.sustain = sustain;
        self.release = release;
    }

    /// Trigger the envelope (note on). Retriggers from the current level.
    pub fn gate_on(&mut self) {
        self.stage = Stage::Attack;
        self.stage_samples = (self.attack * self.sample_rate) as usize;
        self.stage_counter = 0;
        self.start_level = self.level;
    }

    /// Release the envelope (note off).
    pub fn gate_off(&mut self) {
        if self.stage == Stage::Idle {
            return;
        }
        self.stage = Stage::Release;
        self.stage_samples = (self.release * self.sample_rate) as usize;
        self.stage_counter = 0;
        self.start_level = self.level;
    }

    /// Cut the envelope to silence immediately, skipping the release.
    pub fn reset(&mut self) {
        self.stage = Stage::Idle;
        self.level = 0.0;
        self.stage_counter = 0;
        self.stage_samples = 0;
        self.start_level = 0.0;
    }

    /// Generate the next envelope sample in [0, 1].
    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            Stage::Idle => {
                self.level = 0.0;
            }
            Stage::Attack => {
                if self.stage_samples == 0 {
                    self.level = 1.0;
                    self.enter_decay();
                } else {
                    let t = self.stage_counter as f32 / self.stage_samples as f32;
                    self.level = self.start_level + (1.0 - self.start_level) * t;
                    self.stage_counter += 1;
                    if self.stage_counter >= self.stage_samples {
                        self.level = 1.0;
                        self.enter_decay();
                    }
                }
            }
            Stage::Decay => {
                if self.stage_samples == 0 {
                    self.level = self.sustain;
                    self.stage = Stage::Sustain;
                } else {
                    let t = self.stage_counter as f32 / self.stage_samples as f32;
                    self.level = 1.0 - (1.0 - self.sustain) * t;
                    self.stage_counter += 1;
                    if self.stage_counter >= self.stage_samples {
                        self.level = self.sustain;
                        self.stage = Stage::Sustain;
                    }
                }
            }
            Stage::Sustain => {
                self.level = self.sustain;
            }
            Stage::Release => {
                if self.stage_samples == 0 {
                    self.level = 0.0;
                    self.stage = Stage::Idle;
                } else {
                    let t = self.stage_counter as f32 / self.stage_samples as f32;
                    self.level = self.start_level * (1.0 - t);
                    self.stage_counter += 1;
                    if self.stage_counter >= self.stage_samples {
                        self.level = 0.0;
                        self.stage = Stage::Idle;
                    }
                }
            }
        }
        self.level
    }

    /// True while the envelope is producing a non-idle signal.
    pub fn is_active(&self) -> bool {
        self.stage != Stage::Idle
    }

    /// True once the envelope has returned to idle.
    pub fn is_finished(&self) -> bool {
        self.stage == Stage::Idle
    }

    fn enter_decay(&mut self) {
        self.stage = Stage::Decay;
        self.stage_samples = (self.decay * self.sample_rate) as usize;
        self.stage_counter = 0;
    }
}
