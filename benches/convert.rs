use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;
use criterion::Criterion;
use meshport::ConvertOptions;
use meshport::TableSource;

/// `side` by `side` unit squares, bilinear or biquadratic.
fn grid(side: usize, quadratic: bool) -> TableSource {
    let step = if quadratic { 2 } else { 1 };
    let width = step * side + 1;
    let node = |x: usize, y: usize| 1 + x + y * width;

    let mut source = TableSource::new(2);
    for y in 0..width {
        for x in 0..width {
            let position = [x as f64 / step as f64, y as f64 / step as f64, 0.0];
            source.add_node(node(x, y), position);
        }
    }
    for j in 0..side {
        for i in 0..side {
            let (x, y) = (step * i, step * j);
            let mut nodes = vec![
                node(x, y),
                node(x + step, y),
                node(x + step, y + step),
                node(x, y + step),
            ];
            if quadratic {
                nodes.extend([
                    node(x + 1, y),
                    node(x + 2, y + 1),
                    node(x + 1, y + 2),
                    node(x, y + 1),
                    node(x + 1, y + 1),
                ]);
            }
            let element = 1 + i + j * side;
            source.add_element(1, element, nodes);
            if j == 0 {
                source.add_side(1, element, 0);
            }
        }
    }
    source
}

pub fn bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");
    for (name, quadratic) in [("linear", false), ("quadratic", true)] {
        let source = grid(200, quadratic);
        let options = ConvertOptions {
            generate_edges: true,
            ..ConvertOptions::default()
        };
        group.bench_function(name, |b| {
            b.iter(|| meshport::convert(black_box(&source), &options).unwrap())
        });
    }
}

criterion_group!(benches, bench);
criterion_main!(benches);
