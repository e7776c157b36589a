use std::io::Cursor;
use std::net::SocketAddr;
use std::path::Path;

use image::{DynamicImage, GenericImageView, ImageBuffer, ImageOutputFormat, Rgb};
use padresize::Config;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use tempfile::TempDir;
use tokio::net::TcpListener;

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb([250, 120, 0])));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageOutputFormat::Png).unwrap();
    buf.into_inner()
}

async fn start_server(output_dir: &Path) -> SocketAddr {
    let mut config = Config::default();
    config.server.output_dir = output_dir.to_path_buf();
    config.processing.workers = 2;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(padresize::web::serve_on(listener, config));
    addr
}

fn file_part(name: &str, data: Vec<u8>) -> Part {
    Part::bytes(data).file_name(name.to_string())
}

#[tokio::test]
async fn test_form_and_health() {
    let dir = TempDir::new().unwrap();
    let addr = start_server(&dir.path().join("out")).await;

    let health = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(health.text().await.unwrap(), "ok");

    let form = reqwest::get(format!("http://{}/", addr)).await.unwrap();
    assert_eq!(form.status(), StatusCode::OK);
    let html = form.text().await.unwrap();
    assert!(html.contains("name=\"files\""));
    assert!(html.contains("name=\"bgcolor\""));
}

#[tokio::test]
async fn test_upload_writes_padded_images() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let addr = start_server(&out).await;

    let form = Form::new()
        .part("files", file_part("wide.png", png_bytes(100, 50)))
        .part("files", file_part("tall.png", png_bytes(30, 90)))
        .part("files", file_part("empty.jpg", Vec::new()))
        .text("width", "200")
        .text("height", "200")
        .text("bgcolor", "#000000");

    let response = reqwest::Client::new()
        .post(format!("http://{}/resize", addr))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = response.text().await.unwrap();
    assert!(html.contains("2 of 3 images resized to 200x200 on #000000 (1 failed)"));
    assert!(html.contains("href=\"/processed/wide.jpeg\""));
    assert!(html.contains("empty.jpg: Failed to decode image"));

    let wide = image::open(out.join("wide.jpeg")).unwrap();
    assert_eq!(wide.dimensions(), (200, 200));
    assert_eq!(image::open(out.join("tall.jpeg")).unwrap().dimensions(), (200, 200));

    let download = reqwest::get(format!("http://{}/processed/wide.jpeg", addr)).await.unwrap();
    assert_eq!(download.status(), StatusCode::OK);
    assert_eq!(download.headers()["content-type"], "image/jpeg");
    let body = download.bytes().await.unwrap();
    assert_eq!(image::load_from_memory(&body).unwrap().dimensions(), (200, 200));
}

#[tokio::test]
async fn test_malformed_color_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let addr = start_server(&out).await;

    let form = Form::new()
        .part("files", file_part("wide.png", png_bytes(100, 50)))
        .text("width", "200")
        .text("height", "200")
        .text("bgcolor", "red");

    let response = reqwest::Client::new()
        .post(format!("http://{}/resize", addr))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let html = response.text().await.unwrap();
    assert!(html.contains("Background color must look like #rrggbb"));
    assert!(!out.exists());
}

#[tokio::test]
async fn test_non_numeric_height_is_rejected() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let addr = start_server(&out).await;

    let form = Form::new()
        .part("files", file_part("a.png", png_bytes(10, 10)))
        .text("width", "200")
        .text("height", "tall")
        .text("bgcolor", "#ffffff");

    let response = reqwest::Client::new()
        .post(format!("http://{}/resize", addr))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.text().await.unwrap().contains("Height must be an integer"));
    assert!(!out.exists());
}

#[tokio::test]
async fn test_download_rejects_unknown_names() {
    let dir = TempDir::new().unwrap();
    let addr = start_server(&dir.path().join("out")).await;

    let response = reqwest::get(format!("http://{}/processed/missing.jpeg", addr)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_uploads_all_complete() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let addr = start_server(&out).await;
    let client = reqwest::Client::new();

    let requests: Vec<_> = (0..5)
        .map(|request| {
            let client = client.clone();
            tokio::spawn(async move {
                let form = Form::new()
                    .part("files", file_part(&format!("a{}.png", request), png_bytes(300, 200)))
                    .part("files", file_part(&format!("b{}.png", request), png_bytes(200, 300)))
                    .text("width", "250")
                    .text("height", "250")
                    .text("bgcolor", "#ffffff");
                client
                    .post(format!("http://{}/resize", addr))
                    .multipart(form)
                    .send()
                    .await
                    .unwrap()
            })
        })
        .collect();

    for request in requests {
        let response = request.await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.text().await.unwrap().contains("2 of 2 images resized to 250x250"));
    }

    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 10);
}
