use anyhow::{Context, Result};
use chiffre_core::{FieldSnapshot, WalletSnapshot};
use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};

/// Prometheus view over field and wallet snapshots.
///
/// Reads snapshots only; it never holds wallets or the field itself.
pub struct ChiffreMetrics {
    registry: Registry,
    pub field_density: Gauge,
    pub wallet_balance: GaugeVec,
    pub wallet_volatility_bias: GaugeVec,
    pub wallet_stability_bias: GaugeVec,
    pub wallet_mutation_events: GaugeVec,
    pub population_mean_balance: Gauge,
}

impl ChiffreMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let field_density = Gauge::with_opts(Opts::new(
            "chiffre_field_density",
            "Density of the shared scarcity field",
        ))?;
        let wallet_balance = GaugeVec::new(
            Opts::new("chiffre_wallet_balance", "Balance per wallet"),
            &["wallet"],
        )?;
        let wallet_volatility_bias = GaugeVec::new(
            Opts::new(
                "chiffre_wallet_volatility_bias",
                "Volatility bias accumulated in wallet memory",
            ),
            &["wallet"],
        )?;
        let wallet_stability_bias = GaugeVec::new(
            Opts::new(
                "chiffre_wallet_stability_bias",
                "Stability bias accumulated in wallet memory",
            ),
            &["wallet"],
        )?;
        let wallet_mutation_events = GaugeVec::new(
            Opts::new(
                "chiffre_wallet_mutation_events",
                "Mutations applied per wallet",
            ),
            &["wallet"],
        )?;
        let population_mean_balance = Gauge::with_opts(Opts::new(
            "chiffre_population_mean_balance",
            "Mean balance over the observed wallets",
        ))?;

        registry
            .register(Box::new(field_density.clone()))
            .context("register chiffre_field_density")?;
        registry
            .register(Box::new(wallet_balance.clone()))
            .context("register chiffre_wallet_balance")?;
        registry
            .register(Box::new(wallet_volatility_bias.clone()))
            .context("register chiffre_wallet_volatility_bias")?;
        registry
            .register(Box::new(wallet_stability_bias.clone()))
            .context("register chiffre_wallet_stability_bias")?;
        registry
            .register(Box::new(wallet_mutation_events.clone()))
            .context("register chiffre_wallet_mutation_events")?;
        registry
            .register(Box::new(population_mean_balance.clone()))
            .context("register chiffre_population_mean_balance")?;

        Ok(Self {
            registry,
            field_density,
            wallet_balance,
            wallet_volatility_bias,
            wallet_stability_bias,
            wallet_mutation_events,
            population_mean_balance,
        })
    }

    pub fn observe_field(&self, field: &FieldSnapshot) {
        self.field_density.set(field.density);
    }

    pub fn observe_wallet(&self, wallet_id: &str, wallet: &WalletSnapshot) {
        let labels = [wallet_id];
        self.wallet_balance
            .with_label_values(&labels)
            .set(wallet.balance);
        self.wallet_volatility_bias
            .with_label_values(&labels)
            .set(wallet.memory.volatility_bias);
        self.wallet_stability_bias
            .with_label_values(&labels)
            .set(wallet.memory.stability_bias);
        self.wallet_mutation_events
            .with_label_values(&labels)
            .set(wallet.memory.events as f64);
    }

    /// Observe a whole population, labelling wallets by their index.
    pub fn observe_population(&self, field: &FieldSnapshot, wallets: &[WalletSnapshot]) {
        self.observe_field(field);
        for (idx, wallet) in wallets.iter().enumerate() {
            self.observe_wallet(&idx.to_string(), wallet);
        }
        self.population_mean_balance.set(mean_balance(wallets));
    }

    /// Text exposition format.
    pub fn render(&self) -> Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .context("encode metrics")?;
        String::from_utf8(buf).context("metrics are not valid UTF-8")
    }
}

pub fn mean_balance(wallets: &[WalletSnapshot]) -> f64 {
    if wallets.is_empty() {
        return 0.0;
    }
    let sum: f64 = wallets.iter().map(|w| w.balance).sum();
    sum / wallets.len() as f64
}
