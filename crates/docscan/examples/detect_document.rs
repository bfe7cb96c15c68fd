use docscan::detect;
use docscan::DetectorConfig;
use image::ImageReader;

#[cfg(feature = "tracing")]
use docscan_core::init_tracing;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "tracing")]
    init_tracing(false);
    #[cfg(not(feature = "tracing"))]
    let _ = docscan::core::init_with_level(log::LevelFilter::Info);

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("Usage: detect_document <image_path>");
        return Ok(());
    };

    let img = ImageReader::open(path)?.decode()?.to_luma8();
    let detection = detect::detect_document(&img, &DetectorConfig::document())?;

    if detection.is_fallback() {
        println!("no confident detection, fallback rectangle:");
    } else {
        println!("detected (confidence {:.2}):", detection.confidence);
    }
    for (label, p) in ["TL", "TR", "BR", "BL"].iter().zip(detection.quad.points()) {
        println!("  {label}: ({:.1}, {:.1})", p.x, p.y);
    }

    Ok(())
}
