//! Cohort market: a two-type agent economy driven round by round.
//!
//! Demonstrates:
//!   1. Declaring agent classes with explicit command sets
//!   2. Creating owning groups and populating them with `append`
//!   3. Two-phase dispatch: firms send offers, households receive them
//!      only after every firm has produced
//!   4. Composite groups restricted to their shared commands
//!   5. Round advancement, deletion with id reuse, and logging
//!
//! Run with:
//!   RUST_LOG=cohort_engine=debug cargo run --example market

use cohort_core::{
    Agent, AgentAddress, AgentClass, AgentError, CommandContext, Message, Params, RoundHook,
    RoundId, Value,
};
use cohort_engine::{DispatchMode, Group, GroupConfig, LogRequest};
use cohort_store::{StoreConfig, StoreHandle};

const FIRMS: usize = 3;
const HOUSEHOLDS: u32 = 6;
const ROUNDS: u64 = 4;

// ─── Firm: produces goods and offers them to households ─────────

struct Firm {
    me: AgentAddress,
    stock: f64,
    productivity: f64,
    revenue: f64,
}

impl Agent for Firm {
    fn init(&mut self, params: &Params) -> Result<(), AgentError> {
        self.productivity = params
            .get("productivity")
            .and_then(Value::as_f64)
            .unwrap_or(1.0);
        Ok(())
    }

    fn execute(
        &mut self,
        ctx: &mut CommandContext<'_>,
        command: &str,
        _args: &[Value],
    ) -> Result<Value, AgentError> {
        match command {
            "produce" => {
                self.stock += self.productivity;
                // Offer one unit to a household picked by firm id and round.
                let buyer = (self.me.id.0 + ctx.round().0 as u32) % HOUSEHOLDS;
                ctx.send(AgentAddress::new("household", buyer), "offer", 1.0);
                Ok(Value::Float(self.stock))
            }
            "report" => Ok(Value::Float(self.revenue)),
            other => Err(AgentError::unknown_command(other)),
        }
    }

    fn receive(&mut self, message: Message) -> Result<(), AgentError> {
        if message.topic == "payment" {
            self.revenue += message.payload.as_f64().unwrap_or(0.0);
            self.stock -= 1.0;
        }
        Ok(())
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "stock" => Some(Value::Float(self.stock)),
            "revenue" => Some(Value::Float(self.revenue)),
            _ => None,
        }
    }
}

// ─── Household: buys offered goods and consumes at round end ────

struct Household {
    money: f64,
    offers: Vec<AgentAddress>,
    goods: f64,
}

impl Agent for Household {
    fn init(&mut self, params: &Params) -> Result<(), AgentError> {
        self.money = params.get("money").and_then(Value::as_f64).unwrap_or(10.0);
        Ok(())
    }

    fn execute(
        &mut self,
        ctx: &mut CommandContext<'_>,
        command: &str,
        _args: &[Value],
    ) -> Result<Value, AgentError> {
        match command {
            "buy" => {
                let mut bought = 0;
                for seller in self.offers.drain(..) {
                    if self.money >= 2.0 {
                        self.money -= 2.0;
                        self.goods += 1.0;
                        ctx.send(seller, "payment", 2.0);
                        bought += 1;
                    }
                }
                Ok(Value::Int(bought))
            }
            "report" => Ok(Value::Float(self.money)),
            other => Err(AgentError::unknown_command(other)),
        }
    }

    fn receive(&mut self, message: Message) -> Result<(), AgentError> {
        if message.topic == "offer" {
            self.offers.push(message.from);
        }
        Ok(())
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "money" => Some(Value::Float(self.money)),
            "goods" => Some(Value::Float(self.goods)),
            _ => None,
        }
    }

    fn round_hook(&mut self) -> Option<&mut dyn RoundHook> {
        Some(self)
    }
}

impl RoundHook for Household {
    fn advance_round(&mut self, _round: RoundId) -> Result<(), AgentError> {
        // Consume half the pantry and earn a wage.
        self.goods *= 0.5;
        self.money += 1.0;
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    println!("=== Cohort Market ===\n");

    let store = StoreHandle::new(StoreConfig::default())?;

    let firm_class = AgentClass::new("firm", ["produce", "report"], |spawn| {
        Box::new(Firm {
            me: spawn.address(),
            stock: 0.0,
            productivity: 1.0,
            revenue: 0.0,
        })
    });
    let household_class = AgentClass::new("household", ["buy", "report"], |_| {
        Box::new(Household {
            money: 0.0,
            offers: Vec::new(),
            goods: 0.0,
        })
    });

    let parallel = GroupConfig {
        dispatch_mode: DispatchMode::Parallel,
        ..GroupConfig::default()
    };
    let mut firms = Group::new(&store, "firm", firm_class, parallel)?;
    let mut households = Group::new(&store, "household", household_class, GroupConfig::default())?;

    let mut params = Params::new();
    params.insert("productivity".into(), Value::Float(2.0));
    firms.append_many(FIRMS, &params)?;
    households.append_many(HOUSEHOLDS as usize, &Params::new())?;
    println!(
        "Created {} firms and {} households (firm workers: {})\n",
        firms.count()?,
        households.count()?,
        firms.workers()
    );

    let mut everyone = firms.union(&households)?;
    println!(
        "Composite group commands: {:?}\n",
        everyone.capabilities().iter().collect::<Vec<_>>()
    );

    for r in 1..=ROUNDS {
        let round = RoundId(r);
        firms.advance_round(round)?;
        households.advance_round(round)?;

        let stock = firms.dispatch("produce", &[])?;
        let bought = households.dispatch("buy", &[])?;
        let sold: i64 = bought.iter().filter_map(Value::as_i64).sum();
        println!("Round {r}: firm stock {stock:?}, units sold {sold}");

        let money = households.agg_log(&LogRequest::new().possessions(["money", "goods"]))?;
        if let Some(m) = money.get("money").and_then(|a| a.mean()) {
            println!("         mean household money {m:.2}");
        }
    }

    println!("\nHousehold 2 leaves the market; its id is recycled.");
    households.delete(2u32.into())?;
    let newcomer = households.append(&Params::new())?;
    println!("Newcomer received id {newcomer}");

    let reports = everyone.dispatch("report", &[])?;
    println!("\nFinal reports (firms, then households): {reports:?}");

    for record in firms.panel_log(&LogRequest::new().variables(["stock", "revenue"]))? {
        println!("  {} after '{}': {:?}", record.address, record.context, record.values);
    }
    Ok(())
}
