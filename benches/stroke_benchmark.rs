//! Benchmarks for the stroke pipeline hot paths
//!
//! Covers the per-sample cost of weighted smoothing plus Bézier fitting,
//! and the queue coalescing pass over a large pending list.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use strokeflow::geometry::{Point, Rect};
use strokeflow::image::{Image, LayerId, LayerNode};
use strokeflow::input::{InputDevice, RawPointerEvent, SampleBuilder};
use strokeflow::stroke::{
    PaintOpPreset, PaintOpSettings, ResourcesSnapshot, SmoothingConfig, StrokeExecutor,
    StrokeHelper, StrokeId, StrokeJobData, StrokeStrategy,
};
use strokeflow::update::{RectsWalker, UpdateQueue, UpdaterContext};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Executor that counts jobs and throws them away
#[derive(Default)]
struct SinkExecutor {
    jobs: usize,
}

impl StrokeExecutor for SinkExecutor {
    fn start_stroke(&mut self, _strategy: StrokeStrategy) -> StrokeId {
        StrokeId(1)
    }

    fn add_job(&mut self, _id: StrokeId, data: StrokeJobData) -> bool {
        black_box(&data);
        self.jobs += 1;
        true
    }

    fn end_stroke(&mut self, _id: StrokeId) {}
}

fn make_resources() -> Arc<ResourcesSnapshot> {
    let mut image = Image::new(Rect::from_xywh(0, 0, 2000, 2000));
    image.add_layer(LayerNode::new(
        LayerId(1),
        "paint",
        Rect::from_xywh(0, 0, 2000, 2000),
    ));
    let preset = PaintOpPreset::new("bench-brush", PaintOpSettings::default());
    Arc::new(ResourcesSnapshot::new(Some(&image), None, preset).expect("valid image"))
}

fn make_events(count: usize) -> Vec<RawPointerEvent> {
    (0..count)
        .map(|i| {
            let t = i as f32;
            let pos = Point::new(t * 3.0, 500.0 + (t * 0.12).sin() * 200.0);
            let mut event = RawPointerEvent::at(pos, InputDevice::Stylus, 1000 + i as u64 * 7);
            event.pressure = Some((128.0 + (t * 0.3).sin() * 100.0) as u16);
            event
        })
        .collect()
}

fn bench_weighted_stroke(c: &mut Criterion) {
    init_tracing();
    let resources = make_resources();
    let events = make_events(500);

    c.bench_function("weighted_stroke_500_samples", |b| {
        b.iter(|| {
            let mut helper = StrokeHelper::new(SampleBuilder::new(), "Bench Stroke");
            helper.set_smoothness(SmoothingConfig::weighted(80.0, 0.15));
            let mut executor = SinkExecutor::default();

            helper
                .init_paint(&events[0], Arc::clone(&resources), &mut executor)
                .expect("stroke starts");
            for event in &events[1..] {
                helper.paint(event, &mut executor);
            }
            helper.end_paint(&mut executor);
            black_box(executor.jobs)
        })
    });
}

fn bench_queue_optimize(c: &mut Criterion) {
    let layer = Arc::new(LayerNode::new(
        LayerId(1),
        "paint",
        Rect::from_xywh(0, 0, 2000, 2000),
    ));

    // A drag of overlapping dirty rects plus scattered isolated ones
    let mut rects = Vec::new();
    for i in 0..64i32 {
        rects.push(Rect::from_xywh(i * 12, i * 12, 40, 40));
    }
    for i in 0..32i32 {
        rects.push(Rect::from_xywh(1500 + (i % 8) * 60, (i / 8) * 60, 20, 20));
    }

    c.bench_function("queue_optimize_96_walkers", |b| {
        b.iter(|| {
            let queue = UpdateQueue::new();
            let mut context = UpdaterContext::new(4);
            queue.block_processing();
            for rect in &rects {
                let mut walker = RectsWalker::new(Rect::from_xywh(0, 0, 2000, 2000));
                walker.collect_rects(&layer, *rect);
                queue.add_job(Arc::new(walker), &mut context);
            }
            queue.optimize();
            black_box(queue.len())
        })
    });
}

criterion_group!(benches, bench_weighted_stroke, bench_queue_optimize);
criterion_main!(benches);
