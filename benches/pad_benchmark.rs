use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{DynamicImage, ImageBuffer, Rgba};
use padresize::processing::FilterType;
use padresize::{resize_and_pad, BackgroundColor, TargetBox};

fn sample_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(ImageBuffer::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
    }))
}

fn benchmark_resize_and_pad(c: &mut Criterion) {
    let mut group = c.benchmark_group("resize_and_pad");
    let target = TargetBox::new(800, 800).unwrap();

    for (width, height) in [(1920, 1080), (1080, 1920), (800, 800), (400, 300)] {
        let source = sample_image(width, height);

        for filter in [FilterType::Triangle, FilterType::Lanczos3] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", filter), format!("{}x{}", width, height)),
                &source,
                |b, source| {
                    b.iter(|| {
                        resize_and_pad(black_box(source), target, BackgroundColor::WHITE, filter).unwrap()
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, benchmark_resize_and_pad);
criterion_main!(benches);
