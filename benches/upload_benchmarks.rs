use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use texture_upload::types::MemoryType;
use texture_upload::{
    find_memory_type, BufferDescriptor, BufferUsage, DeviceBuffer, DeviceImage, DummyBackend,
    DummyCommandBuffer, HostBuffer, ImageAspect, ImageDescriptor, MemoryProperties,
    MemoryPropertyFlags, TextureFormat, TextureUsage,
};

// ---------------------------------------------------------------------------
// Memory-type selection
// ---------------------------------------------------------------------------

fn bench_find_memory_type(c: &mut Criterion) {
    let discrete = MemoryProperties::discrete();
    c.bench_function("find_memory_type_discrete", |b| {
        b.iter(|| {
            black_box(find_memory_type(
                black_box(&discrete),
                black_box(0b11),
                MemoryPropertyFlags::DEVICE_LOCAL,
            ))
        });
    });

    // Worst case: the only match is the last of 32 advertised types.
    let mut types = vec![MemoryType::new(MemoryPropertyFlags::HOST_VISIBLE, 0); 31];
    types.push(MemoryType::new(MemoryPropertyFlags::DEVICE_LOCAL, 0));
    let crowded = MemoryProperties::new(types, Vec::new());
    c.bench_function("find_memory_type_32_types", |b| {
        b.iter(|| {
            black_box(find_memory_type(
                black_box(&crowded),
                black_box(u32::MAX),
                MemoryPropertyFlags::DEVICE_LOCAL,
            ))
        });
    });
}

// ---------------------------------------------------------------------------
// Resource construction
// ---------------------------------------------------------------------------

fn bench_create_buffer(c: &mut Criterion) {
    let backend = Arc::new(DummyBackend::new());
    let properties = backend.memory_properties().clone();
    let desc = BufferDescriptor::new(64 * 1024, BufferUsage::VERTEX | BufferUsage::COPY_DST);

    c.bench_function("device_buffer_create_drop_64k", |b| {
        b.iter(|| {
            let buffer = DeviceBuffer::new(backend.clone(), &properties, &desc).unwrap();
            black_box(buffer.raw());
        });
    });
}

fn bench_create_image(c: &mut Criterion) {
    let backend = Arc::new(DummyBackend::new());
    let properties = backend.memory_properties().clone();
    let desc = ImageDescriptor::new_2d(
        256,
        256,
        TextureFormat::Rgba8Unorm,
        TextureUsage::COPY_DST | TextureUsage::TEXTURE_BINDING,
    );

    c.bench_function("device_image_create_drop_256x256", |b| {
        b.iter(|| {
            let image =
                DeviceImage::new(backend.clone(), &properties, &desc, ImageAspect::COLOR).unwrap();
            black_box(image.view());
        });
    });
}

// ---------------------------------------------------------------------------
// Upload recording and replay
// ---------------------------------------------------------------------------

fn bench_record_image_upload(c: &mut Criterion) {
    let backend = Arc::new(DummyBackend::new());
    let properties = backend.memory_properties().clone();
    let desc = ImageDescriptor::new_2d(
        256,
        256,
        TextureFormat::Rgba8Unorm,
        TextureUsage::COPY_DST | TextureUsage::TEXTURE_BINDING,
    );
    let staging = HostBuffer::new(backend.clone(), &properties, 256 * 256 * 4).unwrap();

    c.bench_function("device_image_record_upload", |b| {
        b.iter_with_setup(
            || {
                DeviceImage::new(backend.clone(), &properties, &desc, ImageAspect::COLOR).unwrap()
            },
            |mut image| {
                let mut cmd = DummyCommandBuffer::new();
                image.store(&mut cmd, staging.raw(), 256, 256).unwrap();
                black_box(cmd.len());
            },
        );
    });
}

fn bench_submit_image_upload(c: &mut Criterion) {
    let backend = Arc::new(DummyBackend::new());
    let properties = backend.memory_properties().clone();
    let desc = ImageDescriptor::new_2d(
        256,
        256,
        TextureFormat::Rgba8Unorm,
        TextureUsage::COPY_DST | TextureUsage::TEXTURE_BINDING,
    );
    let pixels = vec![0x7fu8; 256 * 256 * 4];
    let staging = HostBuffer::with_data(backend.clone(), &properties, &pixels).unwrap();

    c.bench_function("dummy_submit_image_upload_256x256", |b| {
        b.iter_with_setup(
            || {
                let mut image =
                    DeviceImage::new(backend.clone(), &properties, &desc, ImageAspect::COLOR)
                        .unwrap();
                let mut cmd = DummyCommandBuffer::new();
                image.store(&mut cmd, staging.raw(), 256, 256).unwrap();
                (image, cmd)
            },
            |(image, cmd)| {
                backend.submit(&cmd).unwrap();
                black_box(image.raw());
            },
        );
    });
}

criterion_group!(
    benches,
    bench_find_memory_type,
    bench_create_buffer,
    bench_create_image,
    bench_record_image_upload,
    bench_submit_image_upload,
);
criterion_main!(benches);
