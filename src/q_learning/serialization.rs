//! Serialization support for temporal difference learning agents.

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::{
    config::SolverConfig,
    ports::Learner,
    q_learning::agent::{QLearningAgent, SarsaAgent, TdAgentState},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TdAlgorithm {
    QLearning,
    Sarsa,
}

/// Provenance stored next to a saved agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    pub episodes_trained: usize,
    pub scenario: Option<String>,
    pub seed: Option<u64>,
    pub config: Option<SolverConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTdAgent {
    pub version: u32,
    pub algorithm: TdAlgorithm,
    state: TdAgentState,
    pub metadata: TrainingMetadata,
}

pub enum TdLearner {
    QLearning(QLearningAgent),
    Sarsa(SarsaAgent),
}

impl TdLearner {
    pub fn into_box(self) -> Box<dyn Learner> {
        match self {
            TdLearner::QLearning(agent) => Box::new(agent),
            TdLearner::Sarsa(agent) => Box::new(agent),
        }
    }
}

impl SavedTdAgent {
    pub const VERSION: u32 = 1;

    pub fn from_q_learning(agent: &QLearningAgent, metadata: TrainingMetadata) -> Self {
        Self {
            version: Self::VERSION,
            algorithm: TdAlgorithm::QLearning,
            state: agent.export_state(),
            metadata,
        }
    }

    pub fn from_sarsa(agent: &SarsaAgent, metadata: TrainingMetadata) -> Self {
        Self {
            version: Self::VERSION,
            algorithm: TdAlgorithm::Sarsa,
            state: agent.export_state(),
            metadata,
        }
    }

    /// Snapshot whichever TD agent sits behind a `dyn Learner`.
    pub fn from_learner(learner: &dyn Learner, metadata: TrainingMetadata) -> Result<Self> {
        let any = learner.as_any();
        if let Some(agent) = any.downcast_ref::<QLearningAgent>() {
            Ok(Self::from_q_learning(agent, metadata))
        } else if let Some(agent) = any.downcast_ref::<SarsaAgent>() {
            Ok(Self::from_sarsa(agent, metadata))
        } else {
            Err(anyhow!("{} is not a TD agent and cannot be saved", learner.name()))
        }
    }

    pub fn q_table_size(&self) -> usize {
        self.state.q_table.size()
    }

    pub fn to_agent(&self) -> Result<TdLearner> {
        if self.version != Self::VERSION {
            return Err(anyhow!(
                "Unsupported TD save format version: {}. Expected {}",
                self.version,
                Self::VERSION
            ));
        }

        match self.algorithm {
            TdAlgorithm::QLearning => Ok(TdLearner::QLearning(QLearningAgent::from_state(
                self.state.clone(),
            ))),
            TdAlgorithm::Sarsa => Ok(TdLearner::Sarsa(SarsaAgent::from_state(self.state.clone()))),
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create file: {}", path.as_ref().display()))?;
        let mut writer = BufWriter::new(file);

        rmp_serde::encode::write(&mut writer, self).context("Failed to serialize TD agent")?;

        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())
            .with_context(|| format!("Failed to open file: {}", path.as_ref().display()))?;
        let reader = BufReader::new(file);

        rmp_serde::decode::from_read(reader).context("Failed to deserialize TD agent")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ports::Transition,
        types::{Action, ActionMask},
    };

    fn train_once<L: Learner>(agent: &mut L) -> Result<()> {
        for (state, action, next_state) in [(0, Action::Right, 1), (1, Action::Down, 4)] {
            agent.update(&Transition {
                state,
                action,
                reward: -1.0,
                next_state,
                done: next_state == 4,
                next_valid: ActionMask::ALL,
            })?;
        }
        agent.end_episode();
        Ok(())
    }

    #[test]
    fn test_q_learning_roundtrip() -> Result<()> {
        let mut agent = QLearningAgent::new(&SolverConfig::new())?.with_seed(7);
        train_once(&mut agent)?;
        assert!(agent.q_table().size() > 0);

        let saved = SavedTdAgent::from_q_learning(&agent, TrainingMetadata::default());
        let bytes = rmp_serde::to_vec(&saved)?;
        let loaded: SavedTdAgent = rmp_serde::from_slice(&bytes)?;
        let restored = loaded.to_agent()?;

        match restored {
            TdLearner::QLearning(restored_agent) => {
                assert_eq!(restored_agent.q_table().size(), agent.q_table().size());
                assert_eq!(
                    restored_agent.q_table().get(0, Action::Right),
                    agent.q_table().get(0, Action::Right)
                );
                assert_eq!(restored_agent.epsilon(), agent.epsilon());
            }
            TdLearner::Sarsa(_) => panic!("Expected Q-learning agent"),
        }

        Ok(())
    }

    #[test]
    fn test_sarsa_roundtrip_through_file() -> Result<()> {
        let mut agent = SarsaAgent::new(&SolverConfig::new())?.with_seed(11);
        train_once(&mut agent)?;

        let metadata = TrainingMetadata {
            episodes_trained: 1,
            scenario: Some("open-field".to_string()),
            seed: Some(11),
            config: Some(SolverConfig::new()),
        };
        let saved = SavedTdAgent::from_learner(&agent, metadata.clone())?;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("agent.msgpack");
        saved.save_to_file(&path)?;
        let loaded = SavedTdAgent::load_from_file(&path)?;
        assert_eq!(loaded.metadata, metadata);
        assert_eq!(loaded.algorithm, TdAlgorithm::Sarsa);

        match loaded.to_agent()? {
            TdLearner::Sarsa(restored_agent) => {
                assert_eq!(restored_agent.q_table().size(), agent.q_table().size());
            }
            TdLearner::QLearning(_) => panic!("Expected SARSA agent"),
        }

        Ok(())
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let agent = QLearningAgent::new(&SolverConfig::new()).unwrap();
        let mut saved = SavedTdAgent::from_q_learning(&agent, TrainingMetadata::default());
        saved.version = 99;
        assert!(saved.to_agent().is_err());
    }
}
