//! Benchmarks for closure and full games.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand::rngs::StdRng;

use sapper::agent::Agent;
use sapper::cell::{Cell, Grid};
use sapper::field::Minefield;
use sapper::game::Game;
use sapper::select::RandomSelector;
use sapper::sentence::Sentence;

fn bench_expert_game(c: &mut Criterion) {
    let grid = Grid::new(16, 30).unwrap();

    c.bench_function("game_16x30_99", |bench| {
        let mut seed = 0u64;
        bench.iter(|| {
            seed += 1;
            let mut rng = StdRng::seed_from_u64(seed);
            let field = Minefield::random(grid, 99, &mut rng).unwrap();
            let mut game = Game::new(field);
            black_box(game.play(&mut RandomSelector::new(rng)).unwrap())
        })
    });
}

fn bench_overlapping_windows(c: &mut Criterion) {
    // Windows of four over a strip, hazards on every third cell.
    let n = 48;
    let grid = Grid::new(1, n).unwrap();
    let windows: Vec<Sentence> = (0..n - 3)
        .map(|start| {
            let cells: Vec<Cell> = (start..start + 4).map(|i| Cell::new(0, i)).collect();
            let count = cells.iter().filter(|c| c.col % 3 == 0).count();
            Sentence::new(cells, count).unwrap()
        })
        .collect();

    c.bench_function("closure_windows_48", |bench| {
        bench.iter(|| {
            let mut agent = Agent::new(grid);
            for window in &windows {
                agent.add_sentence(window.clone()).unwrap();
            }
            black_box(agent.known_hazards().len())
        })
    });
}

criterion_group!(benches, bench_expert_game, bench_overlapping_windows);
criterion_main!(benches);
