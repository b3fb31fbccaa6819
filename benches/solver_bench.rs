//! Benchmarks for the parasol solver.
use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use parasol::{Config, Constraint, ConstraintKind, Model, Point, Segment, solve};

/// A skewed quadrilateral plus the constraints that square it up into a
/// pinned 4x3 rectangle. Fully determined: 8 unknowns, 8 equations.
fn rectangle() -> (Model, Vec<Constraint>) {
    let model = Model::new(
        vec![
            Point::new("a", 0.1, -0.2),
            Point::new("b", 3.9, 0.3),
            Point::new("c", 4.2, 2.8),
            Point::new("d", -0.3, 3.1),
        ],
        vec![
            Segment::new("ab", "a", "b"),
            Segment::new("bc", "b", "c"),
            Segment::new("cd", "c", "d"),
            Segment::new("da", "d", "a"),
        ],
    );
    let constraints = vec![
        Constraint::new(
            "pin_a",
            ConstraintKind::FixPoint {
                p: "a".into(),
                x: Some(0.0),
                y: Some(0.0),
            },
        ),
        Constraint::new("bottom", ConstraintKind::Horizontal { segment: "ab".into() }),
        Constraint::new("top", ConstraintKind::Horizontal { segment: "cd".into() }),
        Constraint::new("right", ConstraintKind::Vertical { segment: "bc".into() }),
        Constraint::new("left", ConstraintKind::Vertical { segment: "da".into() }),
        Constraint::new(
            "width",
            ConstraintKind::Distance {
                a: "a".into(),
                b: "b".into(),
                distance: 4.0,
            },
        ),
        Constraint::new(
            "height",
            ConstraintKind::Distance {
                a: "a".into(),
                b: "d".into(),
                distance: 3.0,
            },
        ),
    ];
    (model, constraints)
}

/// A chain of `n` points, each a fixed distance from the previous, with
/// the first pinned. Scales the system size linearly.
fn chain(n: usize) -> (Model, Vec<Constraint>) {
    let points = (0..n)
        .map(|i| Point::new(format!("p{i}"), i as f64 + 0.3, (i % 3) as f64 * 0.2))
        .collect();
    let mut constraints = vec![Constraint::new(
        "pin",
        ConstraintKind::FixPoint {
            p: "p0".into(),
            x: None,
            y: None,
        },
    )];
    for i in 1..n {
        constraints.push(Constraint::new(
            format!("link{i}"),
            ConstraintKind::Distance {
                a: format!("p{}", i - 1).into(),
                b: format!("p{i}").into(),
                distance: 1.0,
            },
        ));
    }
    (Model::new(points, vec![]), constraints)
}

fn solve_rectangle(c: &mut Criterion) {
    let (model, constraints) = rectangle();
    c.bench_function("solve_rectangle", |b| {
        b.iter(|| black_box(solve(&model, &constraints, Config::default()).unwrap()));
    });
}

fn solve_chain(c: &mut Criterion) {
    for n in [10, 50] {
        let (model, constraints) = chain(n);
        c.bench_function(&format!("solve_chain_{n}"), |b| {
            b.iter(|| black_box(solve(&model, &constraints, Config::default()).unwrap()));
        });
    }
}

criterion_group!(benches, solve_rectangle, solve_chain);
criterion_main!(benches);
