#![allow(dead_code)]

use orga_oracle::address::{AccAddress, ValAddress};
use orga_oracle::context::Context;
use orga_oracle::mock::{MockAccounts, MockBank, MockStaking};
use orga_oracle::oracle::{
    begin_blocker, end_blocker, Denom, GenesisState, Keeper, Msg, MsgAggregateExchangeRateVote,
    Params, MODULE_NAME,
};
use orga_oracle::store::{MapStore, Shared, Store};
use orga_oracle::Result;

pub const AUTHORITY: AccAddress = AccAddress::new([200; 20]);

pub struct App {
    pub keeper: Keeper<MockStaking, MockBank>,
    pub staking: MockStaking,
    pub bank: MockBank,
    pub validators: Vec<ValAddress>,
}

pub fn params(whitelist: &[&str]) -> Params {
    Params {
        whitelist: whitelist.iter().copied().map(Denom::new).collect(),
        ..Default::default()
    }
}

pub fn setup(powers: &[i64], params: Params) -> App {
    let _ = pretty_env_logger::try_init();

    let staking = MockStaking::with_bonded(powers);
    let bank = MockBank::new();
    let accounts = MockAccounts::with_module(MODULE_NAME, AccAddress::new([201; 20]));
    let mut keeper = Keeper::new(
        Store::new(Shared::new(MapStore::new())),
        &accounts,
        bank.clone(),
        staking.clone(),
        AUTHORITY,
    );
    let genesis = GenesisState {
        params,
        ..Default::default()
    };
    keeper.init_genesis(&Context::new(0, 0), &genesis).unwrap();

    App {
        keeper,
        validators: staking.operators(),
        staking,
        bank,
    }
}

impl App {
    /// Submits a vote from validator `i` signed by its own account.
    pub fn vote(&mut self, ctx: &mut Context, i: usize, rates: &str) -> Result<()> {
        let validator = self.validators[i];
        let msg = MsgAggregateExchangeRateVote::new(rates, validator.into(), validator);
        self.keeper
            .handle(ctx, &Msg::AggregateExchangeRateVote(msg))
    }

    /// Runs a whole block: begin blocker, the given votes, end blocker.
    pub fn block(&mut self, height: i64, seconds: i64, votes: &[(usize, &str)]) -> Context {
        let mut ctx = Context::from_seconds(height, seconds);
        begin_blocker(&mut self.keeper, &mut ctx).unwrap();
        for (i, rates) in votes {
            self.vote(&mut ctx, *i, rates).unwrap();
        }
        end_blocker(&mut self.keeper, &mut ctx).unwrap();
        ctx
    }
}
