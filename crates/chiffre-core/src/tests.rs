use crate::{
    CyclePhase, EthicsScore, Field, FieldConfig, LogNormalParams, Memory, MutationConfig,
    MutationSource, RestGate, RngSource, Wallet, WalletError, WalletState,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

const EPS: f64 = 1e-12;

/// Always returns the same factor, whatever the parameters.
struct ConstantSource(f64);

impl MutationSource for ConstantSource {
    fn sample_log_normal(&mut self, _params: LogNormalParams) -> f64 {
        self.0
    }
}

fn isolated_wallet(initial: f64) -> Wallet {
    Wallet::with_field(initial, Field::shared())
}

#[test]
fn negative_amounts_are_rejected_without_side_effects() {
    let mut wallet = isolated_wallet(100.0);
    let memory = wallet.memory();

    for amount in [-0.01, -30.0, f64::NAN, f64::NEG_INFINITY] {
        let spent = wallet.spend(amount);
        assert!(matches!(
            spent,
            Err(WalletError::InvalidArgument { op: "spend", .. })
        ));
        let received = wallet.receive(amount);
        assert!(matches!(
            received,
            Err(WalletError::InvalidArgument { op: "receive", .. })
        ));
    }

    assert_eq!(wallet.total(), 100.0);
    assert_eq!(wallet.memory(), memory);
}

#[test]
fn unbounded_positive_amounts_are_accepted() {
    let mut wallet = isolated_wallet(100.0);
    wallet.receive(f64::INFINITY).unwrap();
    assert_eq!(wallet.total(), f64::INFINITY);
    assert!((wallet.memory().stability_bias - 1.001).abs() < EPS);

    let mut spender = isolated_wallet(100.0);
    spender.spend(f64::INFINITY).unwrap();
    assert_eq!(spender.total(), f64::NEG_INFINITY);
}

#[test]
fn spend_decreases_balance_and_raises_both_biases() {
    let mut wallet = isolated_wallet(100.0);
    wallet.spend(30.0).unwrap();

    assert_eq!(wallet.total(), 70.0);
    let mem = wallet.memory();
    assert!(mem.stability_bias > 1.0);
    assert!(mem.volatility_bias > 1.0);
    assert!((mem.stability_bias - (1.0 + 0.001 * 30.0 / 1e6)).abs() < EPS);
    assert!((mem.volatility_bias - (1.0 + 0.0005 * 30.0 / 1e6)).abs() < EPS);
    assert_eq!(mem.events, 0);
}

#[test]
fn receive_destabilizes_less_than_an_equal_spend() {
    let mut receiver = isolated_wallet(100.0);
    let mut spender = isolated_wallet(100.0);
    receiver.receive(30.0).unwrap();
    spender.spend(30.0).unwrap();

    assert_eq!(receiver.total(), 130.0);
    let received_gain = receiver.memory().volatility_bias - 1.0;
    let spent_gain = spender.memory().volatility_bias - 1.0;
    assert!(received_gain > 0.0);
    assert!(received_gain < spent_gain);
    assert!((received_gain * 2.0 - spent_gain).abs() < EPS);
    assert_eq!(
        receiver.memory().stability_bias,
        spender.memory().stability_bias
    );
}

#[test]
fn flow_magnitude_is_capped() {
    let mut huge = isolated_wallet(0.0);
    let mut capped = isolated_wallet(0.0);
    huge.receive(1e15).unwrap();
    capped.receive(1e6).unwrap();

    assert_eq!(huge.memory(), capped.memory());
    assert!((huge.memory().stability_bias - 1.001).abs() < EPS);
}

#[test]
fn consume_at_cap_pins_density_to_floor() {
    let field = Field::new();
    assert_eq!(field.density(), 1.0);
    field.consume(1e12);
    assert_eq!(field.density(), 0.50);
}

#[test]
fn dissolve_at_cap_pins_density_to_ceiling() {
    let field = Field::new();
    field.dissolve(1e30);
    assert_eq!(field.density(), 2.00);
    field.reset();
    assert_eq!(field.density(), 1.0);
}

#[test]
fn negative_or_nan_field_amounts_are_ignored() {
    let field = Field::new();
    field.consume(-1e9);
    field.dissolve(-5.0);
    field.consume(f64::NAN);
    assert_eq!(field.density(), 1.0);
}

#[test]
fn density_stays_within_bounds_for_any_sequence() {
    let field = Field::new();
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..10_000 {
        let exponent: i32 = rng.gen_range(0..16);
        let amount = rng.gen_range(0.0..10.0) * 10f64.powi(exponent);
        if rng.gen_bool(0.5) {
            field.consume(amount);
        } else {
            field.dissolve(amount);
        }
        let d = field.density();
        assert!((0.50..=2.00).contains(&d), "density escaped: {d}");
    }
}

#[test]
fn params_for_full_ethics_at_half_cycle() {
    let wallet = isolated_wallet(100.0);
    let params = wallet.mutation_params(EthicsScore::new(1.0), CyclePhase::new(0.5));

    assert!((params.mu_log - 0.01).abs() < EPS);
    assert!((params.sigma_log - 0.01).abs() < EPS);
}

#[test]
fn cycle_boost_peaks_at_quarter_and_dips_at_three_quarters() {
    let wallet = isolated_wallet(1.0);
    let neutral = EthicsScore::default();

    let peak = wallet.mutation_params(neutral, CyclePhase::new(0.25));
    let trough = wallet.mutation_params(neutral, CyclePhase::new(0.75));
    let start = wallet.mutation_params(neutral, CyclePhase::new(0.0));

    assert!((peak.sigma_log - 0.03).abs() < EPS);
    assert!((trough.sigma_log - 0.01).abs() < EPS);
    assert!((start.sigma_log - 0.02).abs() < EPS);
    assert!(peak.mu_log.abs() < EPS);
}

#[test]
fn out_of_range_context_is_clamped() {
    let wallet = isolated_wallet(1.0);

    let wild = wallet.mutation_params(EthicsScore::new(-40.0), CyclePhase::new(7.0));
    let bounded = wallet.mutation_params(EthicsScore::new(-1.0), CyclePhase::new(1.0));
    assert_eq!(wild, bounded);
    assert!((bounded.mu_log + 0.01).abs() < EPS);
    assert!((bounded.sigma_log - 0.03).abs() < 1e-9);

    let nan = wallet.mutation_params(EthicsScore::new(f64::NAN), CyclePhase::new(f64::NAN));
    let neutral = wallet.mutation_params(EthicsScore::default(), CyclePhase::default());
    assert_eq!(nan, neutral);
}

#[test]
fn field_density_shifts_drift_within_band() {
    let field = Field::shared();
    let wallet = Wallet::with_field(1.0, Arc::clone(&field));
    let neutral = EthicsScore::default();
    let phase = CyclePhase::default();

    field.consume(1e12);
    let scarce = wallet.mutation_params(neutral, phase);
    assert!((scarce.mu_log - 1.10f64.ln()).abs() < EPS);

    field.dissolve(1e12);
    let abundant = wallet.mutation_params(neutral, phase);
    assert!((abundant.mu_log - 0.90f64.ln()).abs() < EPS);
}

#[test]
fn sigma_never_collapses_below_floor() {
    let mut wallet = isolated_wallet(1.0);
    let cfg = MutationConfig {
        base_sigma: 1e-9,
        ..MutationConfig::default()
    };
    wallet = wallet.with_config(cfg).unwrap();

    let params = wallet.mutation_params(EthicsScore::new(1.0), CyclePhase::new(0.75));
    assert_eq!(params.sigma_log, 1e-6);
}

#[test]
fn gain_consumes_the_field_and_updates_memory() {
    let field = Field::shared();
    let mut wallet = Wallet::with_field(100.0, Arc::clone(&field));

    let delta = wallet.mutate(
        EthicsScore::new(1.0),
        CyclePhase::new(0.5),
        &mut ConstantSource(1.1),
    );

    assert!((delta - 10.0).abs() < 1e-9);
    assert!((wallet.total() - 110.0).abs() < 1e-9);
    assert!((field.density() - (1.0 - 1e-6 * delta)).abs() < EPS);

    let mem = wallet.memory();
    assert_eq!(mem.events, 1);
    assert!((mem.volatility_bias - (1.0 + 1.1f64.ln())).abs() < EPS);
    assert!((mem.stability_bias - 1.5).abs() < EPS);
}

#[test]
fn loss_dissolves_into_the_field() {
    let field = Field::shared();
    let mut wallet = Wallet::with_field(100.0, Arc::clone(&field));

    let delta = wallet.mutate(
        EthicsScore::new(-0.5),
        CyclePhase::default(),
        &mut ConstantSource(0.9),
    );

    assert!((delta + 10.0).abs() < 1e-9);
    assert!((field.density() - (1.0 + 1e-6 * 10.0)).abs() < 1e-12);
    // Negative ethics never touches stability.
    assert_eq!(wallet.memory().stability_bias, 1.0);
    assert!((wallet.memory().volatility_bias - (1.0 + 0.9f64.ln().abs())).abs() < EPS);
}

#[test]
fn stability_uses_the_unclamped_ethics_score() {
    let mut wallet = isolated_wallet(100.0);
    let mut unit = ConstantSource(1.0);

    wallet.mutate(EthicsScore::new(2.0), CyclePhase::default(), &mut unit);
    assert!((wallet.memory().stability_bias - 2.0).abs() < EPS);

    wallet.mutate(EthicsScore::new(10.0), CyclePhase::default(), &mut unit);
    assert_eq!(wallet.memory().stability_bias, 3.0);

    let mut neutral = isolated_wallet(100.0);
    neutral.mutate(EthicsScore::new(f64::NAN), CyclePhase::default(), &mut unit);
    assert_eq!(neutral.memory().stability_bias, 1.0);
    assert_eq!(neutral.memory().events, 1);
}

#[test]
fn seeded_mutations_are_reproducible() {
    let run = |seed: u64| -> Vec<f64> {
        let mut wallet = isolated_wallet(1_000.0);
        let mut source = RngSource::seeded(seed);
        (0..50)
            .map(|i| {
                wallet.mutate(
                    EthicsScore::new(0.2),
                    CyclePhase::from_step(i, 12),
                    &mut source,
                )
            })
            .collect()
    };

    assert_eq!(run(42), run(42));
    assert_ne!(run(42), run(43));
}

#[test]
fn biases_are_monotone_and_capped() {
    let mut wallet = isolated_wallet(500.0);
    let mut rng = StdRng::seed_from_u64(11);
    let mut source = RngSource::seeded(12);
    let mut previous = wallet.memory();

    for step in 0..2_000u64 {
        match rng.gen_range(0..3) {
            0 => wallet.spend(rng.gen_range(0.0..5e6)).unwrap(),
            1 => wallet.receive(rng.gen_range(0.0..5e6)).unwrap(),
            _ => {
                wallet.mutate(
                    EthicsScore::new(rng.gen_range(-1.5..1.5)),
                    CyclePhase::from_step(step, 24),
                    &mut source,
                );
            }
        }

        let mem = wallet.memory();
        assert!(mem.volatility_bias >= previous.volatility_bias);
        assert!(mem.stability_bias >= previous.stability_bias);
        assert!(mem.volatility_bias <= 3.0);
        assert!(mem.stability_bias <= 3.0);
        assert!(mem.events >= previous.events);
        previous = mem;
    }
}

#[test]
fn ungated_mutation_runs_in_circulation() {
    let mut wallet = isolated_wallet(10.0);
    assert_eq!(wallet.state(), WalletState::Circulation);

    let delta = wallet.mutate(
        EthicsScore::default(),
        CyclePhase::default(),
        &mut ConstantSource(2.0),
    );
    assert!((delta - 10.0).abs() < EPS);
    assert_eq!(wallet.memory().events, 1);
}

#[test]
fn rest_gate_blocks_circulating_wallets() {
    let field = Field::shared();
    let cfg = MutationConfig {
        rest_gate: RestGate::RestOnly,
        ..MutationConfig::default()
    };
    let mut wallet = Wallet::with_field(10.0, Arc::clone(&field))
        .with_config(cfg)
        .unwrap();
    let mut source = ConstantSource(2.0);

    let blocked = wallet.mutate(EthicsScore::default(), CyclePhase::default(), &mut source);
    assert_eq!(blocked, 0.0);
    assert_eq!(wallet.total(), 10.0);
    assert_eq!(wallet.memory(), Memory::default());
    assert_eq!(field.density(), 1.0);

    wallet.set_state(WalletState::Rest);
    let applied = wallet.mutate(EthicsScore::default(), CyclePhase::default(), &mut source);
    assert!((applied - 10.0).abs() < EPS);
}

#[test]
fn invalid_factor_leaves_balance_unchanged() {
    let field = Field::shared();
    let mut wallet = Wallet::with_field(10.0, Arc::clone(&field));

    let delta = wallet.mutate(
        EthicsScore::default(),
        CyclePhase::default(),
        &mut ConstantSource(-3.0),
    );
    assert_eq!(delta, 0.0);
    assert_eq!(wallet.total(), 10.0);
    assert_eq!(wallet.memory().events, 1);
    assert_eq!(wallet.memory().volatility_bias, 1.0);
    assert_eq!(field.density(), 1.0);
}

#[test]
fn state_toggles_freely() {
    let mut wallet = Wallet::default();
    for _ in 0..3 {
        wallet.set_state(WalletState::Rest);
        assert_eq!(wallet.state(), WalletState::Rest);
        wallet.set_state(WalletState::Circulation);
        assert_eq!(wallet.state(), WalletState::Circulation);
    }
    assert_eq!(wallet.total(), 0.0);
}

#[test]
fn default_wallets_share_the_global_field() {
    let a = Wallet::new(1.0);
    let b = Wallet::new(2.0);
    assert!(Arc::ptr_eq(a.field(), b.field()));
    assert!(Arc::ptr_eq(a.field(), &Field::global()));
}

#[test]
fn snapshots_serialize_for_external_readers() {
    let mut wallet = isolated_wallet(12.5);
    wallet.set_state(WalletState::Rest);
    let json = serde_json::to_value(wallet.snapshot()).unwrap();

    assert_eq!(json["balance"], 12.5);
    assert_eq!(json["state"], "Rest");
    assert_eq!(json["memory"]["events"], 0);
    assert_eq!(
        serde_json::to_value(wallet.field().snapshot()).unwrap()["density"],
        1.0
    );
}

#[test]
fn partial_profiles_fill_in_defaults() {
    let cfg = MutationConfig::from_json_str(r#"{ "base_sigma": 0.05, "rest_gate": "rest_only" }"#)
        .unwrap();
    assert_eq!(cfg.base_sigma, 0.05);
    assert_eq!(cfg.rest_gate, RestGate::RestOnly);
    assert_eq!(MutationConfig::from_json_str("{}").unwrap(), MutationConfig::default());

    let field = FieldConfig::from_json_str(r#"{ "cap": 1e9 }"#).unwrap();
    assert_eq!(field.cap, 1e9);
    assert_eq!(field.min_density, 0.5);
}

#[test]
fn invalid_profiles_are_rejected() {
    assert!(MutationConfig::from_json_str(r#"{ "base_sigma": 0.0 }"#).is_err());
    assert!(MutationConfig::from_json_str(r#"{ "base_sigma": -0.02 }"#).is_err());
    assert!(MutationConfig::from_json_str("not json").is_err());
    assert!(FieldConfig::from_json_str(r#"{ "min_density": 3.0 }"#).is_err());
    assert!(Field::with_config(FieldConfig {
        neutral_density: 5.0,
        ..FieldConfig::default()
    })
    .is_err());
}

#[test]
fn cycle_phase_wraps_steps() {
    assert_eq!(CyclePhase::from_step(3, 12).phase, 0.25);
    assert_eq!(CyclePhase::from_step(15, 12).phase, 0.25);
    assert_eq!(CyclePhase::from_step(5, 0).phase, 0.0);
}
