//! Trade execution against the portfolio.
//!
//! Applies exactly one decision and returns the next portfolio plus the
//! record of the step. Infeasible requests are errors, never clamped.

use chrono::NaiveDateTime;

use super::config::TradingConfig;
use super::decision::{Action, Decision, TradeRecord};
use super::error::TradeboxError;
use super::portfolio::Portfolio;
use super::position::Holding;

/// Clear a pause whose cooldown has run out by `t`.
pub fn release_expired_pause(portfolio: &Portfolio, t: NaiveDateTime) -> Portfolio {
    let expired = portfolio.paused && portfolio.pause_until.is_none_or(|until| t >= until);
    if !expired {
        return portfolio.clone();
    }
    Portfolio {
        paused: false,
        pause_until: None,
        ..portfolio.clone()
    }
}

pub fn execute(
    portfolio: &Portfolio,
    decision: &Decision,
    price: f64,
    t: NaiveDateTime,
    config: &TradingConfig,
) -> Result<(Portfolio, TradeRecord), TradeboxError> {
    let infeasible = |reason: String| TradeboxError::InfeasibleDecision {
        action: decision.action,
        reason,
    };

    if decision.action.is_trade() && !(price.is_finite() && price > 0.0) {
        return Err(infeasible(format!("price {price} is not tradable")));
    }

    let mut next = portfolio.clone();
    let mut entry_price = None;

    match decision.action {
        Action::Buy => {
            let amount = decision.amount;
            if !(amount.is_finite() && amount > 0.0) {
                return Err(infeasible(format!("amount {amount} must be positive")));
            }
            if amount > portfolio.cash {
                return Err(infeasible(format!(
                    "amount {:.2} exceeds cash {:.2}",
                    amount, portfolio.cash
                )));
            }
            let quantity = amount / price;
            next.cash = portfolio.cash - amount;
            next.holding = Some(match &portfolio.holding {
                Some(h) if h.quantity > 0.0 => h.add_lot(quantity, price),
                _ => Holding::new(quantity, price),
            });
        }
        Action::SellAll => {
            let holding = open_holding(portfolio).ok_or_else(|| infeasible("no holding to sell".into()))?;
            next.cash = portfolio.cash + holding.market_value(price);
            next.holding = None;
            entry_price = Some(holding.average_entry_price);
        }
        Action::SellHalf => {
            let holding = open_holding(portfolio).ok_or_else(|| infeasible("no holding to sell".into()))?;
            let remaining = holding.halve();
            next.cash = portfolio.cash + (holding.quantity - remaining.quantity) * price;
            next.holding = Some(remaining);
            entry_price = Some(holding.average_entry_price);
        }
        Action::Pause => {
            next.paused = true;
            let cooldown = config.circuit_breaker.cooldown;
            let until = t
                .checked_add_signed(cooldown)
                .ok_or_else(|| infeasible(format!("cooldown {cooldown} from {t} is out of range")))?;
            next.pause_until = Some(until);
        }
        Action::Hold => {}
    }

    let amount = match decision.action {
        Action::Buy => decision.amount,
        Action::SellAll | Action::SellHalf => portfolio.asset_quantity() - next.asset_quantity(),
        Action::Pause | Action::Hold => 0.0,
    };

    let record = TradeRecord {
        timestamp: t,
        action: decision.action,
        strategy: decision.strategy,
        price,
        amount,
        reason: decision.reason.clone(),
        entry_price,
        cash: next.cash,
        asset_quantity: next.asset_quantity(),
        portfolio_value: next.value(price),
        prediction: None,
    };
    Ok((next, record))
}

fn open_holding(portfolio: &Portfolio) -> Option<&Holding> {
    portfolio.holding.as_ref().filter(|h| h.quantity > 0.0)
}
