use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use encounter_core::{
    AgentQuery, BoostedStat, ConsumableKind, DispatchError, EncounterConfig, Loadout,
    LoadoutError, Point, Posture, PostureToggle, SignalCode, SignalTable, Target, TargetId,
    Telegraph, TelegraphFeed, Tick, WorldQuery,
};

use crate::api::{ActionDispatch, DispatchResult, LoadoutProvider};

/// Side effect recorded by the arena, in dispatch order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchRecord {
    TogglePosture { toggle: PostureToggle, on: bool },
    EquipLoadout { loadout: Loadout, gear_set: String },
    MoveTo(Point),
    Consume(ConsumableKind),
    Escape,
    Attack(TargetId),
    TravelTo(Point),
    OpenBank,
    LoadTripSetup,
    CloseBank,
}

/// Starting conditions of an [`Arena`].
#[derive(Clone, Debug)]
pub struct ArenaSetup {
    pub agent_position: Point,
    pub safe_location: Point,
    pub health_pct: u8,
    pub resource_pct: u8,
    /// Starting boost of every boosted stat.
    pub boost_pct: u8,
    /// Stock restored by every trip setup load.
    pub supplies: Vec<(ConsumableKind, u32)>,
    pub gear_sets: Vec<(Loadout, String)>,
    pub trip_setup: Option<String>,
    /// The agent starts out carrying the trip setup.
    pub trip_ready: bool,
    pub opponent_name: String,
    pub signals: SignalTable,
    pub blocked: Vec<Point>,
    /// Health lost per unprotected opponent attack.
    pub opponent_damage: u8,
    /// Opponent hitpoints lost per tick while the agent is attacking it.
    pub agent_damage: u32,
    pub opponent_hitpoints: u32,
}

impl Default for ArenaSetup {
    fn default() -> Self {
        Self {
            agent_position: EncounterConfig::DEFAULT_SAFE_LOCATION,
            safe_location: EncounterConfig::DEFAULT_SAFE_LOCATION,
            health_pct: 100,
            resource_pct: 100,
            boost_pct: 15,
            supplies: vec![
                (ConsumableKind::Food, 12),
                (ConsumableKind::ResourceRestore, 4),
                (ConsumableKind::CombatBoost, 2),
                (ConsumableKind::RangedBoost, 2),
            ],
            gear_sets: vec![
                (Loadout::Melee, "melee gear".into()),
                (Loadout::Ranged, "ranged gear".into()),
                (Loadout::Magic, "magic gear".into()),
            ],
            trip_setup: Some("encounter trip".into()),
            trip_ready: false,
            opponent_name: EncounterConfig::DEFAULT_OPPONENT_NAME.into(),
            signals: SignalTable::default(),
            blocked: Vec::new(),
            opponent_damage: 6,
            agent_damage: 12,
            opponent_hitpoints: 100,
        }
    }
}

#[derive(Debug)]
struct Opponent {
    target: Target,
    hitpoints: u32,
    script: Vec<SignalCode>,
    cursor: usize,
}

impl Opponent {
    fn advance_script(&mut self) {
        if self.script.is_empty() {
            return;
        }
        self.cursor = (self.cursor + 1) % self.script.len();
        self.target.signal = self.script[self.cursor];
    }
}

#[derive(Debug)]
struct ArenaState {
    setup: ArenaSetup,
    tick: Tick,
    position: Point,
    health: u8,
    resource: u8,
    boosts: HashMap<BoostedStat, u8>,
    stock: HashMap<ConsumableKind, u32>,
    postures: HashSet<PostureToggle>,
    equipped: Option<Loadout>,
    engaged: Option<TargetId>,
    in_combat: bool,
    trip_ready: bool,
    gear_sets: HashMap<Loadout, String>,
    blocked: HashSet<Point>,
    opponents: Vec<Opponent>,
    telegraphs: Vec<Telegraph>,
    log: Vec<DispatchRecord>,
    equip_failure: Option<DispatchError>,
    attacks_rejected: bool,
    escape_lands: bool,
}

impl ArenaState {
    fn opponent(&self, id: TargetId) -> Option<&Opponent> {
        self.opponents.iter().find(|opponent| opponent.target.id == id)
    }

    fn opponent_mut(&mut self, id: TargetId) -> Option<&mut Opponent> {
        self.opponents
            .iter_mut()
            .find(|opponent| opponent.target.id == id)
    }

    fn refill(&mut self) {
        for (kind, count) in self.setup.supplies.clone() {
            self.stock.insert(kind, count);
        }
    }

    fn incoming_style(&self, code: SignalCode) -> Option<Posture> {
        let signals = &self.setup.signals;
        if code == signals.magic {
            Some(Posture::Magic)
        } else if code == signals.ranged {
            Some(Posture::Ranged)
        } else if code == signals.melee {
            Some(Posture::Melee)
        } else {
            None
        }
    }
}

/// Shared, lock-protected sandbox world.
#[derive(Clone)]
pub struct Arena {
    inner: Arc<Mutex<ArenaState>>,
}

impl Arena {
    pub fn new(setup: ArenaSetup) -> Self {
        let mut state = ArenaState {
            tick: Tick::ZERO,
            position: setup.agent_position,
            health: setup.health_pct,
            resource: setup.resource_pct,
            boosts: [BoostedStat::Combat, BoostedStat::Ranged]
                .into_iter()
                .map(|stat| (stat, setup.boost_pct))
                .collect(),
            stock: HashMap::new(),
            postures: HashSet::new(),
            equipped: None,
            engaged: None,
            in_combat: false,
            trip_ready: setup.trip_ready,
            gear_sets: setup.gear_sets.iter().cloned().collect(),
            blocked: setup.blocked.iter().copied().collect(),
            opponents: Vec::new(),
            telegraphs: Vec::new(),
            log: Vec::new(),
            equip_failure: None,
            attacks_rejected: false,
            escape_lands: true,
            setup,
        };
        if state.trip_ready {
            state.refill();
        }
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ArenaState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Places a live, idle opponent on `position`.
    pub fn spawn_opponent(&self, id: u32, position: Point) -> TargetId {
        let mut state = self.lock();
        let id = TargetId(id);
        let hitpoints = state.setup.opponent_hitpoints;
        state.opponents.retain(|opponent| opponent.target.id != id);
        state.opponents.push(Opponent {
            target: Target::new(id, position),
            hitpoints,
            script: vec![SignalCode::IDLE],
            cursor: 0,
        });
        id
    }

    /// Cycles the opponent through `script`, one code per world tick.
    pub fn set_script(&self, id: TargetId, script: Vec<SignalCode>) {
        if let Some(opponent) = self.lock().opponent_mut(id) {
            opponent.target.signal = script.first().copied().unwrap_or(SignalCode::IDLE);
            opponent.script = script;
            opponent.cursor = 0;
        }
    }

    pub fn set_signal(&self, id: TargetId, code: SignalCode) {
        self.set_script(id, vec![code]);
    }

    pub fn set_weakness(&self, id: TargetId, weakness: Option<Posture>) {
        if let Some(opponent) = self.lock().opponent_mut(id) {
            opponent.target.weakness = weakness;
        }
    }

    pub fn move_opponent(&self, id: TargetId, position: Point) {
        if let Some(opponent) = self.lock().opponent_mut(id) {
            opponent.target.position = position;
        }
    }

    pub fn set_opponent_engagement(&self, id: TargetId, targeting_agent: bool, engaged: bool) {
        if let Some(opponent) = self.lock().opponent_mut(id) {
            opponent.target.targeting_agent = targeting_agent;
            opponent.target.engaged = engaged;
        }
    }

    pub fn kill(&self, id: TargetId) {
        let mut state = self.lock();
        if let Some(opponent) = state.opponent_mut(id) {
            opponent.hitpoints = 0;
            opponent.target.alive = false;
        }
        if state.engaged == Some(id) {
            state.engaged = None;
            state.in_combat = false;
        }
    }

    pub fn set_health(&self, percent: u8) {
        self.lock().health = percent.min(100);
    }

    pub fn set_resource(&self, percent: u8) {
        self.lock().resource = percent.min(100);
    }

    pub fn set_boost(&self, stat: BoostedStat, percent: u8) {
        self.lock().boosts.insert(stat, percent);
    }

    pub fn set_stock(&self, kind: ConsumableKind, count: u32) {
        self.lock().stock.insert(kind, count);
    }

    pub fn stock(&self, kind: ConsumableKind) -> u32 {
        self.lock().stock.get(&kind).copied().unwrap_or(0)
    }

    pub fn set_agent_position(&self, position: Point) {
        self.lock().position = position;
    }

    pub fn agent_position(&self) -> Point {
        self.lock().position
    }

    pub fn set_engaged(&self, target: Option<TargetId>) {
        let mut state = self.lock();
        state.engaged = target;
        state.in_combat = target.is_some();
    }

    pub fn set_in_combat(&self, in_combat: bool) {
        self.lock().in_combat = in_combat;
    }

    pub fn block(&self, tile: Point) {
        self.lock().blocked.insert(tile);
    }

    pub fn push_telegraph(&self, telegraph: Telegraph) {
        self.lock().telegraphs.push(telegraph);
    }

    pub fn remove_gear_set(&self, loadout: Loadout) {
        self.lock().gear_sets.remove(&loadout);
    }

    pub fn set_trip_ready(&self, ready: bool) {
        let mut state = self.lock();
        state.trip_ready = ready;
        if ready {
            state.refill();
        }
    }

    /// Makes the next equip fail with `error`.
    pub fn fail_next_equip(&self, error: DispatchError) {
        self.lock().equip_failure = Some(error);
    }

    pub fn set_attacks_rejected(&self, rejected: bool) {
        self.lock().attacks_rejected = rejected;
    }

    /// When `false`, the emergency escape succeeds without moving the agent.
    pub fn set_escape_lands(&self, lands: bool) {
        self.lock().escape_lands = lands;
    }

    pub fn tick(&self) -> Tick {
        self.lock().tick
    }

    pub fn equipped(&self) -> Option<Loadout> {
        self.lock().equipped
    }

    pub fn active_postures(&self) -> Vec<PostureToggle> {
        let state = self.lock();
        PostureToggle::ALL
            .into_iter()
            .filter(|toggle| state.postures.contains(toggle))
            .collect()
    }

    pub fn dispatch_log(&self) -> Vec<DispatchRecord> {
        self.lock().log.clone()
    }

    pub fn clear_log(&self) {
        self.lock().log.clear();
    }

    /// Moves the world forward one tick.
    ///
    /// Opponents advance their signal scripts and hit the agent when it does
    /// not protect against the incoming style; the opponent the agent attacks
    /// loses hitpoints; active postures drain the resource; boosts decay.
    pub fn advance_tick(&self) {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.tick = state.tick + 1;

        let mut incoming = Vec::new();
        for opponent in state.opponents.iter_mut().filter(|o| o.target.alive) {
            opponent.advance_script();
            if opponent.target.targeting_agent {
                incoming.push(opponent.target.signal);
            }
        }
        for code in incoming {
            if let Some(style) = state.incoming_style(code)
                && !state.postures.contains(&PostureToggle::Protect(style))
            {
                state.health = state.health.saturating_sub(state.setup.opponent_damage);
            }
        }

        if let Some(engaged) = state.engaged {
            let damage = state.setup.agent_damage;
            let mut killed = false;
            if let Some(opponent) = state.opponent_mut(engaged) {
                opponent.hitpoints = opponent.hitpoints.saturating_sub(damage);
                if opponent.hitpoints == 0 {
                    opponent.target.alive = false;
                    opponent.target.targeting_agent = false;
                    killed = true;
                }
            }
            if killed {
                state.engaged = None;
                state.in_combat = false;
            }
        }

        if !state.postures.is_empty() {
            state.resource = state.resource.saturating_sub(1);
            if state.resource == 0 {
                state.postures.clear();
            }
        }
        for boost in state.boosts.values_mut() {
            *boost = boost.saturating_sub(1);
        }
    }
}

impl WorldQuery for Arena {
    fn current_tick(&self) -> Tick {
        self.lock().tick
    }

    fn find_opponents(&self, name_filter: &str) -> Vec<Target> {
        let state = self.lock();
        if !state
            .setup
            .opponent_name
            .to_lowercase()
            .contains(&name_filter.to_lowercase())
        {
            return Vec::new();
        }
        state
            .opponents
            .iter()
            .filter(|opponent| opponent.target.alive)
            .map(|opponent| opponent.target.clone())
            .collect()
    }

    fn is_alive(&self, target: TargetId) -> bool {
        self.lock()
            .opponent(target)
            .is_some_and(|opponent| opponent.target.alive)
    }

    fn target_position(&self, target: TargetId) -> Option<Point> {
        self.lock()
            .opponent(target)
            .map(|opponent| opponent.target.position)
    }

    fn signal_code(&self, target: TargetId) -> Option<SignalCode> {
        self.lock()
            .opponent(target)
            .map(|opponent| opponent.target.signal)
    }

    fn weakness(&self, target: TargetId) -> Option<Posture> {
        self.lock()
            .opponent(target)
            .and_then(|opponent| opponent.target.weakness)
    }

    fn distance(&self, from: Point, to: Point) -> Option<u32> {
        from.distance_to(to)
    }

    fn is_walkable(&self, tile: Point) -> bool {
        !self.lock().blocked.contains(&tile)
    }
}

impl AgentQuery for Arena {
    fn health_percent(&self) -> u8 {
        self.lock().health
    }

    fn resource_percent(&self) -> u8 {
        self.lock().resource
    }

    fn boosted_stat_percent(&self, stat: BoostedStat) -> u8 {
        self.lock().boosts.get(&stat).copied().unwrap_or(0)
    }

    fn position(&self) -> Point {
        self.lock().position
    }

    fn is_moving(&self) -> bool {
        false
    }

    fn is_in_combat(&self) -> bool {
        self.lock().in_combat
    }

    fn engaged_with(&self) -> Option<TargetId> {
        self.lock().engaged
    }

    fn has_consumable(&self, kind: ConsumableKind) -> bool {
        self.stock(kind) > 0
    }

    fn is_posture_active(&self, toggle: PostureToggle) -> bool {
        self.lock().postures.contains(&toggle)
    }
}

#[async_trait]
impl ActionDispatch for Arena {
    async fn toggle_posture(&self, toggle: PostureToggle, on: bool) -> DispatchResult {
        let mut state = self.lock();
        state.log.push(DispatchRecord::TogglePosture { toggle, on });
        if on {
            if state.resource == 0 {
                return Err(DispatchError::Rejected("no resource left".into()));
            }
            state.postures.insert(toggle);
        } else {
            state.postures.remove(&toggle);
        }
        Ok(())
    }

    async fn equip_loadout(&self, loadout: Loadout, gear_set: &str) -> DispatchResult {
        let mut state = self.lock();
        state.log.push(DispatchRecord::EquipLoadout {
            loadout,
            gear_set: gear_set.to_owned(),
        });
        if let Some(error) = state.equip_failure.take() {
            return Err(error);
        }
        state.equipped = Some(loadout);
        Ok(())
    }

    async fn move_to(&self, tile: Point) -> DispatchResult {
        let mut state = self.lock();
        state.log.push(DispatchRecord::MoveTo(tile));
        if state.blocked.contains(&tile) {
            return Err(DispatchError::Rejected(format!("{tile} is not walkable")));
        }
        state.position = tile;
        Ok(())
    }

    async fn consume_item(&self, kind: ConsumableKind) -> DispatchResult {
        let mut state = self.lock();
        state.log.push(DispatchRecord::Consume(kind));
        let left = state.stock.get(&kind).copied().unwrap_or(0);
        if left == 0 {
            return Err(DispatchError::Rejected(format!("no {kind} left")));
        }
        state.stock.insert(kind, left - 1);
        match kind {
            ConsumableKind::Food => state.health = state.health.saturating_add(20).min(100),
            ConsumableKind::ResourceRestore => {
                state.resource = state.resource.saturating_add(25).min(100)
            }
            ConsumableKind::CombatBoost => {
                state.boosts.insert(BoostedStat::Combat, 15);
            }
            ConsumableKind::RangedBoost => {
                state.boosts.insert(BoostedStat::Ranged, 15);
            }
        }
        Ok(())
    }

    async fn escape_to_safety(&self) -> DispatchResult {
        let mut state = self.lock();
        state.log.push(DispatchRecord::Escape);
        if state.escape_lands {
            state.position = state.setup.safe_location;
        }
        state.engaged = None;
        state.in_combat = false;
        state.trip_ready = false;
        for opponent in &mut state.opponents {
            opponent.target.targeting_agent = false;
        }
        Ok(())
    }

    async fn attack(&self, target: TargetId) -> DispatchResult {
        let mut state = self.lock();
        state.log.push(DispatchRecord::Attack(target));
        if state.attacks_rejected {
            return Err(DispatchError::Rejected("attack interrupted".into()));
        }
        let Some(opponent) = state.opponent_mut(target).filter(|o| o.target.alive) else {
            return Err(DispatchError::Rejected(format!("{target} cannot be attacked")));
        };
        opponent.target.engaged = true;
        opponent.target.targeting_agent = true;
        state.engaged = Some(target);
        state.in_combat = true;
        Ok(())
    }

    async fn travel_to(&self, destination: Point) -> DispatchResult<bool> {
        let mut state = self.lock();
        state.log.push(DispatchRecord::TravelTo(destination));
        state.position = destination;
        Ok(true)
    }
}

#[async_trait]
impl LoadoutProvider for Arena {
    fn gear_set(&self, loadout: Loadout) -> Option<String> {
        self.lock().gear_sets.get(&loadout).cloned()
    }

    fn trip_setup(&self) -> Option<String> {
        self.lock().setup.trip_setup.clone()
    }

    fn trip_setup_matches(&self) -> bool {
        self.lock().trip_ready
    }

    async fn open_bank(&self) -> DispatchResult {
        self.lock().log.push(DispatchRecord::OpenBank);
        Ok(())
    }

    async fn load_trip_setup(&self) -> Result<(), LoadoutError> {
        let mut state = self.lock();
        state.log.push(DispatchRecord::LoadTripSetup);
        if state.setup.trip_setup.is_none() {
            return Err(LoadoutError::LoadFailed("no trip setup configured".into()));
        }
        state.refill();
        state.trip_ready = true;
        Ok(())
    }

    async fn close_bank(&self) -> DispatchResult {
        self.lock().log.push(DispatchRecord::CloseBank);
        Ok(())
    }
}

impl TelegraphFeed for Arena {
    fn poll_telegraphs(&self) -> Vec<Telegraph> {
        std::mem::take(&mut self.lock().telegraphs)
    }
}
