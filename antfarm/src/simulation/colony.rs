use super::agent::{Agent, AgentKey, LearningParams, Transition};
use super::{GridWorld, WorldError};

use rand::Rng;
use shared::ColonyId;
use slotmap::SlotMap;

pub struct Colony {
    pub colony_id: ColonyId,
    pub agents: SlotMap<AgentKey, Agent>,
    pub resources_collected: u32,
    pub score: i64,
}

/// What a colony did during one tick.
#[derive(Debug, Clone, Default)]
pub struct ColonyTick {
    pub colony_id: ColonyId,
    pub collected: u32,
    pub score_gained: i64,
    pub transitions: Vec<(AgentKey, Transition)>,
}

impl Colony {
    pub fn new<R: Rng + ?Sized>(
        colony_id: ColonyId,
        world: &GridWorld,
        population: u32,
        params: LearningParams,
        rng: &mut R,
    ) -> Result<Self, WorldError> {
        world.check_colony(colony_id)?;

        let mut colony = Self {
            colony_id,
            agents: SlotMap::with_capacity_and_key(population as usize),
            resources_collected: 0,
            score: 0,
        };
        colony.spawn_agents(world, population, params, rng)?;
        Ok(colony)
    }

    pub fn spawn_agents<R: Rng + ?Sized>(
        &mut self,
        world: &GridWorld,
        count: u32,
        params: LearningParams,
        rng: &mut R,
    ) -> Result<(), WorldError> {
        for _ in 0..count {
            self.spawn_agent(world, params, rng)?;
        }
        Ok(())
    }

    pub fn spawn_agent<R: Rng + ?Sized>(
        &mut self,
        world: &GridWorld,
        params: LearningParams,
        rng: &mut R,
    ) -> Result<AgentKey, WorldError> {
        let agent = Agent::new(world, self.colony_id, params, rng)?;
        Ok(self.agents.insert(agent))
    }

    /// Runs every agent once, in insertion order, then decays their exploration.
    pub fn update<R: Rng + ?Sized>(&mut self, world: &mut GridWorld, rng: &mut R) -> ColonyTick {
        let mut tick = ColonyTick {
            colony_id: self.colony_id,
            transitions: Vec::with_capacity(self.agents.len()),
            ..ColonyTick::default()
        };

        for (key, agent) in self.agents.iter_mut() {
            world.pheromones_mut().deposit(agent.position());
            let transition = agent.act(world, rng);

            if transition.reward > 0 {
                self.resources_collected += 1;
                self.score += transition.reward as i64;
                tick.collected += 1;
                tick.score_gained += transition.reward as i64;
            }
            tick.transitions.push((key, transition));
        }

        for agent in self.agents.values_mut() {
            agent.decay_exploration();
        }

        tick
    }

    pub fn population(&self) -> usize {
        self.agents.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use shared::{Position, ResourceKind};

    #[test]
    fn test_colony_spawns_population_on_nests() {
        let world = GridWorld::new(
            10,
            vec![vec![Position::new(1, 1), Position::new(8, 8)]],
        )
        .expect("valid world");
        let mut rng = StdRng::seed_from_u64(7);
        let colony = Colony::new(0, &world, 12, LearningParams::default(), &mut rng).expect("colony exists");

        assert_eq!(colony.population(), 12);
        for agent in colony.agents.values() {
            assert!(world.nests(0).contains(&agent.position()));
        }
    }

    #[test]
    fn test_colony_rejects_unknown_id() {
        let world = GridWorld::new(4, vec![vec![Position::new(0, 0)]]).expect("valid world");
        let mut rng = StdRng::seed_from_u64(7);
        assert!(Colony::new(3, &world, 1, LearningParams::default(), &mut rng).is_err());
    }

    #[test]
    fn test_first_agent_claims_contested_resource() {
        let mut world = GridWorld::new(5, vec![vec![Position::new(2, 2)]]).expect("valid world");
        world.place_resource(Position::new(2, 3), ResourceKind::Food);
        let mut rng = StdRng::seed_from_u64(8);
        let params = LearningParams {
            epsilon_start: 0.0,
            ..LearningParams::default()
        };
        let mut colony = Colony::new(0, &world, 2, params, &mut rng).expect("colony exists");

        let tick = colony.update(&mut world, &mut rng);
        let rewards: Vec<i32> = tick.transitions.iter().map(|(_, t)| t.reward).collect();
        assert_eq!(rewards[0], 10, "First agent in order collects the food");
        assert_ne!(rewards[1], 10, "Second agent cannot collect it again");
        assert_eq!(colony.score, tick.score_gained);
        assert_eq!(colony.resources_collected, tick.collected);
    }

    #[test]
    fn test_update_decays_exploration_once() {
        let mut world = GridWorld::new(5, vec![vec![Position::new(2, 2)]]).expect("valid world");
        let mut rng = StdRng::seed_from_u64(9);
        let mut colony = Colony::new(0, &world, 3, LearningParams::default(), &mut rng).expect("colony exists");

        colony.update(&mut world, &mut rng);
        for agent in colony.agents.values() {
            assert!((agent.epsilon() - 0.995).abs() < 1e-12);
        }
    }
}
