use chiffre_core::{
    CyclePhase, EthicsScore, Field, RngSource, SharedField, Wallet, WalletState,
};
use rand::rngs::StdRng;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

use crate::report::{SimulationReport, WalletReport};
use crate::{SimError, SimulationProfile};

/// A population of wallets coupled through one field.
///
/// Each cycle runs in two phases: wallets at rest mutate in parallel, one
/// seeded generator per worker; then circulating wallets pay a share of
/// their balance to their neighbour, sequentially. With more than one
/// worker, the interleaving of field updates between workers is not fixed,
/// so only single-worker runs are reproducible bit for bit.
pub struct Economy {
    profile: SimulationProfile,
    field: SharedField,
    wallets: Vec<Wallet>,
    ethics: Vec<EthicsScore>,
    sources: Vec<RngSource<StdRng>>,
    cycle: u64,
}

impl Economy {
    pub fn new(profile: SimulationProfile) -> Result<Self, SimError> {
        profile.validate()?;
        let field: SharedField = Arc::new(Field::with_config(profile.field)?);

        let resting = (profile.wallets as f64 * profile.rest_share).round() as usize;
        let mut wallets = Vec::with_capacity(profile.wallets);
        for idx in 0..profile.wallets {
            let mut wallet = Wallet::with_field(profile.initial_balance, Arc::clone(&field))
                .with_config(profile.mutation)?;
            if idx < resting {
                wallet.set_state(WalletState::Rest);
            }
            wallets.push(wallet);
        }

        let ethics = (0..profile.wallets)
            .map(|idx| EthicsScore::new(profile.ethics_for(idx)))
            .collect();
        let workers = profile.workers.min(profile.wallets);
        let sources = (0..workers as u64)
            .map(|worker| RngSource::seeded(profile.seed.wrapping_add(worker)))
            .collect();

        Ok(Self {
            profile,
            field,
            wallets,
            ethics,
            sources,
            cycle: 0,
        })
    }

    pub fn field(&self) -> &SharedField {
        &self.field
    }

    pub fn wallets(&self) -> &[Wallet] {
        &self.wallets
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Run one cycle; returns the summed mutation delta.
    pub fn step(&mut self) -> Result<f64, SimError> {
        let phase = CyclePhase::from_step(self.cycle, self.profile.period);
        let chunk = self.wallets.len().div_ceil(self.sources.len());

        let delta: f64 = thread::scope(|scope| {
            let handles: Vec<_> = self
                .wallets
                .chunks_mut(chunk)
                .zip(self.ethics.chunks(chunk))
                .zip(self.sources.iter_mut())
                .map(|((wallets, ethics), source)| {
                    scope.spawn(move || {
                        wallets
                            .iter_mut()
                            .zip(ethics)
                            .filter(|(wallet, _)| wallet.state() == WalletState::Rest)
                            .map(|(wallet, ethics)| wallet.mutate(*ethics, phase, source))
                            .sum::<f64>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().map_err(|_| SimError::WorkerPanicked))
                .sum::<Result<f64, SimError>>()
        })?;

        self.settle_transfers()?;

        self.cycle += 1;
        let toggle = self.profile.toggle_every;
        if toggle > 0 && self.cycle % toggle == 0 {
            for wallet in &mut self.wallets {
                let next = match wallet.state() {
                    WalletState::Rest => WalletState::Circulation,
                    WalletState::Circulation => WalletState::Rest,
                };
                wallet.set_state(next);
            }
        }

        debug!(
            cycle = self.cycle,
            phase = phase.phase,
            delta,
            density = self.field.density(),
            "cycle complete"
        );
        Ok(delta)
    }

    fn settle_transfers(&mut self) -> Result<(), SimError> {
        let n = self.wallets.len();
        if n < 2 || self.profile.transfer_fraction == 0.0 {
            return Ok(());
        }
        for idx in 0..n {
            let payer = &self.wallets[idx];
            if payer.state() != WalletState::Circulation || payer.total() <= 0.0 {
                continue;
            }
            let amount = payer.total() * self.profile.transfer_fraction;
            self.wallets[idx].spend(amount)?;
            self.wallets[(idx + 1) % n].receive(amount)?;
        }
        Ok(())
    }

    /// Run the remaining configured cycles and summarize.
    pub fn run(&mut self) -> Result<SimulationReport, SimError> {
        info!(
            wallets = self.wallets.len(),
            cycles = self.profile.cycles,
            workers = self.sources.len(),
            seed = self.profile.seed,
            "simulation started"
        );
        while self.cycle < self.profile.cycles {
            self.step()?;
        }
        let report = self.report();
        info!(
            density = report.field.density,
            mean_balance = report.mean_balance,
            mutations = report.total_mutations,
            "simulation finished"
        );
        Ok(report)
    }

    pub fn report(&self) -> SimulationReport {
        let wallets = self
            .wallets
            .iter()
            .zip(&self.ethics)
            .enumerate()
            .map(|(index, (wallet, ethics))| WalletReport {
                index,
                ethics: ethics.score,
                snapshot: wallet.snapshot(),
            })
            .collect();
        SimulationReport::new(
            self.profile.clone(),
            self.cycle,
            self.field.snapshot(),
            wallets,
        )
    }
}
