use rand::{rngs::StdRng, Rng, SeedableRng};

use snake_dqn::game::{
    Action, CollisionType, Direction, GameConfig, GameEngine, GameState, Position, Snake,
};
use snake_dqn::rl::SnakeEnvironment;

fn engine(width: usize, height: usize, seed: u64) -> GameEngine {
    GameEngine::new(GameConfig::new(width, height).with_seed(seed)).unwrap()
}

fn random_move(rng: &mut StdRng) -> Action {
    Action::Move(Direction::ALL[rng.gen_range(0..4)])
}

#[test]
fn food_never_inside_body() {
    let mut engine = engine(6, 6, 17);
    let mut rng = StdRng::seed_from_u64(17);

    for _ in 0..200 {
        let mut state = engine.reset();
        assert!(!state.snake.occupies(state.food));

        while !state.terminal {
            engine.step(&mut state, random_move(&mut rng));
            if !state.terminal {
                assert!(
                    !state.snake.occupies(state.food),
                    "food {:?} inside body {:?}",
                    state.food,
                    state.body()
                );
                assert!(state.body().iter().all(|&p| state.is_in_bounds(p)));
            }
        }
    }
}

#[test]
fn body_grows_exactly_when_food_is_eaten() {
    let config = GameConfig::new(5, 5).with_seed(3);
    let food_reward = config.food_reward;
    let mut engine = GameEngine::new(config).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    let mut growths = 0;

    for _ in 0..300 {
        let mut state = engine.reset();

        while !state.terminal {
            let before = state.snake.len();
            let result = engine.step(&mut state, random_move(&mut rng));
            if result.terminated && result.reward != food_reward {
                break;
            }

            let after = state.snake.len();
            assert!(after >= before);
            assert_eq!(after > before, result.reward == food_reward);
            if after > before {
                assert_eq!(after, before + 1);
                growths += 1;
            }
        }
    }

    assert!(growths > 0, "random play on a 5x5 board should eat at least once");
}

#[test]
fn reversal_behaves_like_keeping_heading() {
    let mut rng = StdRng::seed_from_u64(5);

    for heading in Direction::ALL {
        let mut reversed = engine(12, 12, 9);
        let mut kept = engine(12, 12, 9);

        let snake = Snake::new(Position::new(6, 6), heading, 3);
        let mut a = GameState::new(snake.clone(), Position::new(0, 0), 12, 12);
        let mut b = GameState::new(snake, Position::new(0, 0), 12, 12);
        let mut c = b.clone();

        let ra = reversed.step(&mut a, Action::Move(heading.opposite()));
        let rb = kept.step(&mut b, Action::Move(heading));
        let rc = engine(12, 12, 9).step(&mut c, Action::Continue);

        assert_eq!(ra, rb);
        assert_eq!(rb, rc);
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.heading(), heading);

        // Random follow-up play stays in lockstep
        for _ in 0..20 {
            let action = random_move(&mut rng);
            assert_eq!(reversed.step(&mut a, action), kept.step(&mut b, action));
            assert_eq!(a, b);
        }
    }
}

#[test]
fn stall_terminates_at_ceiling() {
    let config = GameConfig::new(20, 20).with_seed(1);
    let ceiling = config.max_steps_without_food;
    let (death, step_reward) = (config.death_reward, config.step_reward);
    let mut engine = GameEngine::new(config).unwrap();

    let mut state = GameState::new(
        Snake::new(Position::new(5, 5), Direction::Right, 1),
        Position::new(19, 19),
        20,
        20,
    );

    // Circle a 2x2 square forever
    let circuit = [Direction::Right, Direction::Down, Direction::Left, Direction::Up];
    for tick in 1..=ceiling {
        let result = engine.step(&mut state, Action::Move(circuit[(tick as usize) % 4]));

        if tick < ceiling {
            assert!(!result.terminated, "ended early at tick {tick}");
            assert_eq!(result.reward, step_reward);
        } else {
            assert!(result.terminated);
            assert_eq!(result.reward, death);
            assert_eq!(result.info.collision_type, Some(CollisionType::Stall));
        }
    }
    assert_eq!(state.steps, ceiling);
}

#[test]
fn five_rights_reach_the_food() {
    let mut engine = engine(20, 20, 0);
    let mut state = GameState::new(
        Snake::new(Position::new(10, 10), Direction::Right, 1),
        Position::new(15, 10),
        20,
        20,
    );

    for i in 1..=5 {
        let result = engine.step(&mut state, Action::Move(Direction::Right));
        if i < 5 {
            assert_eq!(result.reward, -0.1);
            assert_eq!(state.score, 0);
        } else {
            assert_eq!(result.reward, 100.0);
            assert!(result.info.ate_food);
        }
    }

    assert_eq!(state.score, 1);
    assert_eq!(state.snake.len(), 2);
    assert_eq!(state.snake.head(), Position::new(15, 10));
    assert_ne!(state.food, Position::new(15, 10));
}

#[test]
fn reversal_in_corner_keeps_moving_right() {
    let mut engine = engine(20, 20, 0);
    let mut state = GameState::new(
        Snake::new(Position::new(0, 0), Direction::Right, 1),
        Position::new(10, 10),
        20,
        20,
    );

    let result = engine.step(&mut state, Action::Move(Direction::Left));

    assert!(!result.terminated);
    assert_eq!(state.heading(), Direction::Right);
    assert_eq!(state.snake.head(), Position::new(1, 0));
}

#[test]
fn environment_rejects_out_of_range_actions() {
    let mut env = SnakeEnvironment::new(GameConfig::small().with_seed(2)).unwrap();
    let before = env.observation();

    assert!(env.step(4).is_err());
    assert_eq!(env.observation(), before);
    assert!(env.step(3).is_ok());
}
