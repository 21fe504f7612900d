//! Kinematic character step
//!
//! A pure function of the previous snapshot and one input. Replaying the
//! same inputs from the same snapshot yields bit-identical results, which is
//! what makes it safe to resimulate after a correction.

use crate::{wrap_angle, Buttons, Error, MovementInput, MovementSnapshot, Result, Vec3};
use rewind_core::{InputCommand, StepFunction, TickRate};
use serde::{Deserialize, Serialize};

/// Movement tuning and the step function built from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KinematicStep {
    /// Fixed step in seconds
    pub dt: f32,
    /// Ground speed in units per second
    pub walk_speed: f32,
    /// Speed factor while `SPRINT` is held
    pub sprint_multiplier: f32,
    /// Downward acceleration in units per second squared
    pub gravity: f32,
    /// Initial upward speed of a jump
    pub jump_speed: f32,
    /// Ticks after a jump before the next one is allowed
    pub jump_cooldown_ticks: u32,
}

impl Default for KinematicStep {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            walk_speed: 5.0,
            sprint_multiplier: 1.6,
            gravity: 20.0,
            jump_speed: 7.0,
            jump_cooldown_ticks: 30,
        }
    }
}

impl KinematicStep {
    /// Default tuning stepping at `rate`
    pub fn for_rate(rate: TickRate) -> Self {
        Self {
            dt: rate.delta_seconds(),
            ..Self::default()
        }
    }

    /// Load tuning from RON; omitted fields keep their defaults
    pub fn from_ron(source: &str) -> Result<Self> {
        let step: Self = ron::from_str(source)?;
        step.validate()?;
        Ok(step)
    }

    /// Check the tuning is physically meaningful
    pub fn validate(&self) -> Result<()> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(Error::InvalidTuning(format!("dt must be positive, got {}", self.dt)));
        }
        for (name, value) in [
            ("walk_speed", self.walk_speed),
            ("gravity", self.gravity),
            ("jump_speed", self.jump_speed),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidTuning(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if !self.sprint_multiplier.is_finite() || self.sprint_multiplier < 1.0 {
            return Err(Error::InvalidTuning(format!(
                "sprint_multiplier must be at least 1, got {}",
                self.sprint_multiplier
            )));
        }
        Ok(())
    }

    /// World-space horizontal direction for local axes at `yaw`
    ///
    /// Axes are clamped so diagonal input is no faster than straight input.
    fn heading(input: &MovementInput, yaw: f32) -> Vec3 {
        let x = input.move_x.clamp(-1.0, 1.0);
        let z = input.move_z.clamp(-1.0, 1.0);
        let len = (x * x + z * z).sqrt();
        let (x, z) = if len > 1.0 { (x / len, z / len) } else { (x, z) };

        let (sin, cos) = yaw.sin_cos();
        Vec3::new(x * cos + z * sin, 0.0, z * cos - x * sin)
    }
}

impl StepFunction for KinematicStep {
    type Snapshot = MovementSnapshot;
    type Payload = MovementInput;

    fn step(
        &self,
        previous: &MovementSnapshot,
        command: &InputCommand<MovementInput>,
    ) -> MovementSnapshot {
        let input = command.payload();

        let yaw_delta = if input.yaw_delta.is_finite() { input.yaw_delta } else { 0.0 };
        let rotation = wrap_angle(previous.rotation + yaw_delta);
        let angular_velocity = yaw_delta / self.dt;

        let speed = if input.buttons.contains(Buttons::SPRINT) {
            self.walk_speed * self.sprint_multiplier
        } else {
            self.walk_speed
        };
        let horizontal = Self::heading(input, rotation) * speed;

        let mut jump_ticks_until = previous.jump_ticks_until.saturating_sub(1);
        let vertical = if previous.is_grounded() {
            if input.buttons.contains(Buttons::JUMP) && jump_ticks_until == 0 {
                jump_ticks_until = self.jump_cooldown_ticks;
                self.jump_speed
            } else {
                0.0
            }
        } else {
            previous.velocity.y - self.gravity * self.dt
        };

        let mut velocity = Vec3::new(horizontal.x, vertical, horizontal.z);
        let mut position = previous.position + velocity * self.dt;
        if position.y < 0.0 {
            position.y = 0.0;
            velocity.y = 0.0;
        }

        MovementSnapshot {
            tick: command.tick(),
            last_processed_command: Some(command.tick()),
            position,
            rotation,
            velocity,
            angular_velocity,
            jump_ticks_until,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rewind_core::{DivergencePolicy, EntityId, StateSnapshot};
    use rewind_netcode::{
        AuthorityDriver, DriverConfig, Error as NetcodeError, ReconcileOutcome,
        ReconciliationDriver,
    };
    use std::f32::consts::FRAC_PI_2;

    fn run(
        step: &KinematicStep,
        from: MovementSnapshot,
        inputs: &[MovementInput],
    ) -> MovementSnapshot {
        inputs.iter().fold(from, |state, input| {
            let tick = state.tick + 1;
            step.step(&state, &InputCommand::new(tick, *input))
        })
    }

    #[test]
    fn test_walk_forward() {
        let step = KinematicStep::default();
        let start = MovementSnapshot::spawn(0, Vec3::ZERO);
        let next = step.step(&start, &InputCommand::new(1, MovementInput::axes(0.0, 1.0)));

        assert_eq!(next.tick, 1);
        assert_eq!(next.last_processed_command, Some(1));
        assert_eq!(next.velocity, Vec3::new(0.0, 0.0, 5.0));
        assert!((next.position.z - 5.0 / 60.0).abs() < 1e-6);
        assert_eq!(next.position.y, 0.0);
    }

    #[test]
    fn test_turn_then_walk() {
        let step = KinematicStep::default();
        let start = MovementSnapshot::spawn(0, Vec3::ZERO);
        let next = step.step(
            &start,
            &InputCommand::new(1, MovementInput::axes(0.0, 1.0).turning(FRAC_PI_2)),
        );

        assert!((next.rotation - FRAC_PI_2).abs() < 1e-6);
        assert!((next.angular_velocity - FRAC_PI_2 * 60.0).abs() < 1e-3);
        // Forward at a quarter turn is +x
        assert!((next.velocity.x - 5.0).abs() < 1e-5);
        assert!(next.velocity.z.abs() < 1e-5);
    }

    #[test]
    fn test_diagonal_is_clamped() {
        let step = KinematicStep::default();
        let start = MovementSnapshot::spawn(0, Vec3::ZERO);
        let next = step.step(&start, &InputCommand::new(1, MovementInput::axes(1.0, 1.0)));
        assert!((next.velocity.length() - 5.0).abs() < 1e-5);

        let next = step.step(&start, &InputCommand::new(1, MovementInput::axes(0.0, 40.0)));
        assert!((next.velocity.length() - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_sprint() {
        let step = KinematicStep::default();
        let start = MovementSnapshot::spawn(0, Vec3::ZERO);
        let input = MovementInput::axes(0.0, 1.0).pressing(Buttons::SPRINT);
        let next = step.step(&start, &InputCommand::new(1, input));
        assert!((next.velocity.z - 8.0).abs() < 1e-5);
    }

    #[test]
    fn test_jump_cooldown_and_landing() {
        let step = KinematicStep::default();
        let jump = MovementInput::default().pressing(Buttons::JUMP);
        let start = MovementSnapshot::spawn(0, Vec3::ZERO);

        let airborne = step.step(&start, &InputCommand::new(1, jump));
        assert_eq!(airborne.velocity.y, 7.0);
        assert!(airborne.position.y > 0.0);
        assert_eq!(airborne.jump_ticks_until, 30);

        let landed = run(&step, airborne, &[MovementInput::default(); 60]);
        assert_eq!(landed.position.y, 0.0);
        assert_eq!(landed.velocity.y, 0.0);

        assert_eq!(landed.jump_ticks_until, 0);
        let again = step.step(&landed, &InputCommand::new(landed.tick + 1, jump));
        assert_eq!(again.velocity.y, 7.0);
    }

    #[test]
    fn test_jump_blocked_during_cooldown() {
        let step = KinematicStep::default();
        let mut grounded = MovementSnapshot::spawn(0, Vec3::ZERO);
        grounded.jump_ticks_until = 5;

        let jump = MovementInput::default().pressing(Buttons::JUMP);
        let next = step.step(&grounded, &InputCommand::new(1, jump));
        assert_eq!(next.velocity.y, 0.0);
        assert_eq!(next.jump_ticks_until, 4);
    }

    #[test]
    fn test_from_ron() {
        let step = KinematicStep::from_ron("(walk_speed: 3.0, jump_cooldown_ticks: 10)").unwrap();
        assert_eq!(step.walk_speed, 3.0);
        assert_eq!(step.jump_cooldown_ticks, 10);
        assert_eq!(step.gravity, KinematicStep::default().gravity);

        assert!(matches!(KinematicStep::from_ron("(dt: 0.0)"), Err(Error::InvalidTuning(_))));
        assert!(matches!(
            KinematicStep::from_ron("(sprint_multiplier: 0.5)"),
            Err(Error::InvalidTuning(_))
        ));
        assert!(matches!(KinematicStep::from_ron("(dt: \"fast\")"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_for_rate() {
        let step = KinematicStep::for_rate(TickRate::new(30).unwrap());
        assert!((step.dt - 1.0 / 30.0).abs() < 1e-9);
        assert!(step.validate().is_ok());
    }

    #[test]
    fn test_lost_input_corrects_to_server() {
        let entity = EntityId::new(7);
        let config = DriverConfig::default().with_divergence(MovementSnapshot::default_policy());
        let spawn = MovementSnapshot::spawn(0, Vec3::ZERO);

        let step = KinematicStep::default();
        let mut client =
            ReconciliationDriver::new(entity, step.clone(), spawn.clone(), config.clone()).unwrap();
        let mut server = AuthorityDriver::new(entity, step, spawn, config).unwrap();

        let forward = MovementInput::axes(0.0, 1.0);
        let strafe = MovementInput::axes(1.0, 0.0);
        let inputs: Vec<MovementInput> = (1..=12u64)
            .map(|tick| if tick == 5 { strafe } else { forward })
            .collect();

        for (i, input) in inputs.iter().enumerate() {
            let tick = i as u64 + 1;
            client.tick(Some(*input));
            // The strafe on tick 5 never reaches the server
            if tick != 5 && tick <= 10 {
                server.receive(InputCommand::new(tick, *input)).unwrap();
            }
        }
        for _ in 0..10 {
            server.tick();
        }

        let authoritative = server.latest().clone();
        assert_eq!(authoritative.tick, 10);
        let outcome = client.apply_authoritative(authoritative).unwrap();
        assert_eq!(outcome, ReconcileOutcome::Corrected { replayed: 2 });

        // The server catches up with the client's remaining inputs and lands
        // exactly where the corrected prediction did
        server.receive(InputCommand::new(11, forward)).unwrap();
        server.receive(InputCommand::new(12, forward)).unwrap();
        server.tick();
        server.tick();
        assert_eq!(client.latest(), server.latest());
        assert!(client
            .latest()
            .compare(server.latest(), &DivergencePolicy::strict()));
    }

    #[test]
    fn test_velocity_drift_is_tolerated() {
        let entity = EntityId::new(1);
        let config = DriverConfig::default().with_divergence(MovementSnapshot::default_policy());
        let spawn = MovementSnapshot::spawn(0, Vec3::ZERO);
        let mut client =
            ReconciliationDriver::new(entity, KinematicStep::default(), spawn, config).unwrap();

        for _ in 0..4 {
            client.tick(Some(MovementInput::axes(0.0, 1.0)));
        }
        let mut authoritative = client.history().get(2).cloned().unwrap();
        authoritative.velocity.x += 3.0;
        authoritative.angular_velocity = 1.0;

        let outcome = client.apply_authoritative(authoritative).unwrap();
        assert_eq!(outcome, ReconcileOutcome::Agreed);
        assert_eq!(client.history().oldest_tick(), Some(3));
    }

    #[test]
    fn test_misspelt_divergence_field_rejected_by_driver() {
        let entity = EntityId::new(2);
        let spawn = MovementSnapshot::spawn(0, Vec3::ZERO);
        let config =
            DriverConfig::from_ron(r#"(divergence: (fields: Only(["positon"])))"#).unwrap();

        let step = KinematicStep::default();
        let client = ReconciliationDriver::new(entity, step.clone(), spawn.clone(), config.clone());
        assert!(matches!(client, Err(NetcodeError::InvalidConfig(_))));
        let server = AuthorityDriver::new(entity, step, spawn.clone(), config);
        assert!(matches!(server, Err(NetcodeError::InvalidConfig(_))));

        // Spelled correctly, a displaced position is detected and replayed
        let config =
            DriverConfig::from_ron(r#"(divergence: (fields: Only(["position"])))"#).unwrap();
        let mut client =
            ReconciliationDriver::new(entity, KinematicStep::default(), spawn, config).unwrap();
        for _ in 0..5 {
            client.tick(Some(MovementInput::axes(0.0, 1.0)));
        }
        let mut authoritative = client.history().get(3).cloned().unwrap();
        authoritative.position.x += 2.0;
        assert_eq!(
            client.apply_authoritative(authoritative).unwrap(),
            ReconcileOutcome::Corrected { replayed: 2 }
        );
        assert!((client.latest().position.x - 2.0).abs() < 1e-5);
    }

    fn input_strategy() -> impl Strategy<Value = MovementInput> {
        (-2.0f32..2.0, -2.0f32..2.0, -0.5f32..0.5, 0u8..4).prop_map(|(x, z, yaw, buttons)| {
            MovementInput {
                move_x: x,
                move_z: z,
                yaw_delta: yaw,
                buttons: Buttons(buttons),
            }
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, ..ProptestConfig::default() })]

        #[test]
        fn step_is_deterministic_and_grounded(
            inputs in prop::collection::vec(input_strategy(), 1..120),
        ) {
            let step = KinematicStep::default();
            let start = MovementSnapshot::spawn(0, Vec3::ZERO);
            let a = run(&step, start.clone(), &inputs);
            let b = run(&step, start, &inputs);

            prop_assert_eq!(&a, &b);
            prop_assert!(a.position.y >= 0.0);
            prop_assert!(a.rotation > -std::f32::consts::PI - 1e-6);
            prop_assert!(a.rotation <= std::f32::consts::PI + 1e-6);
            prop_assert_eq!(a.tick, inputs.len() as u64);
        }
    }
}
