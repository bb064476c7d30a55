//! Scenario files: a scripted sale replayed against a manual clock.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokensale_core::{EventLog, ManualClock, SaleReport, TokenSale};
use tokensale_settlement::{DistributionSummary, RecordingTransfer};
use tokensale_types::{
    Principal, Result, SaleConfig, SaleError, SaleEvent, TokenAmount, Wei, ether_to_wei,
    offset_by,
};

/// A scripted sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Deployer; also receives the proceeds.
    pub owner: Principal,
    /// Principals the owner allow-lists before the window opens.
    #[serde(default)]
    pub allow: Vec<Principal>,
    /// Purchases, applied in file order.
    #[serde(default)]
    pub purchases: Vec<ScriptedPurchase>,
    /// Token transfers attempted after distribution.
    #[serde(default)]
    pub transfers: Vec<ScriptedTransfer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedPurchase {
    pub buyer: Principal,
    pub amount_ether: Decimal,
    /// Seconds after `sale_start` at which the purchase is made.
    #[serde(default)]
    pub at_offset_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedTransfer {
    pub from: Principal,
    pub to: Principal,
    pub amount: TokenAmount,
}

/// A scripted call the sale refused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rejection {
    pub step: String,
    pub principal: Principal,
    pub error: String,
}

/// Everything a scenario run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub report: SaleReport,
    pub distribution: DistributionSummary,
    pub rejected: Vec<Rejection>,
    /// Wei each recipient received from withdrawals.
    pub payouts: BTreeMap<Principal, Wei>,
    pub events: Vec<SaleEvent>,
}

impl Scenario {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Replay the scenario from deployment to the last withdrawal.
    ///
    /// Calls the sale refuses are collected as rejections; only a failure of
    /// the lifecycle itself (deploy, end, distribute) aborts the run.
    pub fn run(&self, config: &SaleConfig) -> Result<RunOutcome> {
        let mut sale = TokenSale::deploy(
            config,
            self.owner,
            ManualClock::default(),
            RecordingTransfer::new(),
            EventLog::new(),
        )?;
        let mut rejected = Vec::new();

        for principal in &self.allow {
            sale.set_allowed(self.owner, *principal, true)?;
        }

        let start = sale.terms().sale_start;
        for purchase in &self.purchases {
            let outcome = offset_by(start, purchase.at_offset_secs).and_then(|at| {
                sale.clock_mut().set(at);
                let amount = ether_to_wei(purchase.amount_ether)?;
                sale.purchase(purchase.buyer, amount)
            });
            if let Err(err) = outcome {
                reject(&mut rejected, "purchase", purchase.buyer, &err);
            }
        }

        let end = sale.terms().sale_end;
        sale.clock_mut().set(offset_by(end, 1)?);
        sale.end_sale()?;
        let distribution = sale.distribute()?;

        sale.withdraw_issuer_proceeds()?;
        let buyers: Vec<Principal> = (0..sale.buyer_count())
            .filter_map(|i| sale.buyer_at(i))
            .collect();
        for buyer in buyers {
            match sale.withdraw_refund(buyer) {
                Ok(_) | Err(SaleError::NothingToWithdraw) => {}
                Err(err) => reject(&mut rejected, "withdraw_refund", buyer, &err),
            }
        }

        for t in &self.transfers {
            if let Err(err) = sale.transfer(t.from, t.from, t.to, t.amount) {
                reject(&mut rejected, "transfer", t.from, &err);
            }
        }

        sale.verify_conservation()?;

        let mut payouts = BTreeMap::new();
        let recipients = sale.allocations().iter().map(|a| a.buyer);
        for principal in std::iter::once(self.owner).chain(recipients) {
            let received = sale.value_transfer().received_by(&principal);
            if received > 0 {
                payouts.insert(principal, received);
            }
        }

        Ok(RunOutcome {
            report: sale.report(),
            distribution,
            rejected,
            payouts,
            events: sale.events_mut().drain(),
        })
    }
}

fn reject(rejected: &mut Vec<Rejection>, step: &str, principal: Principal, err: &SaleError) {
    tracing::warn!(step, principal = %principal, error = %err, "Scripted call rejected");
    rejected.push(Rejection {
        step: step.to_string(),
        principal,
        error: err.to_string(),
    });
}
