use docscan::detect;
use docscan::DetectorConfig;
use image::ImageReader;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = docscan::core::init_with_level(log::LevelFilter::Debug);

    let mut args = std::env::args().skip(1);
    let (Some(input), Some(output)) = (args.next(), args.next()) else {
        eprintln!("Usage: scan_id_card <photo> <output_png>");
        return Ok(());
    };

    let img = ImageReader::open(input)?.decode()?.to_rgb8();
    let detection = detect::detect_document_rgb(&img, &DetectorConfig::id_card())?;
    println!(
        "card corners: {:?} (confidence {:.2}, fallback: {})",
        detection.quad.points(),
        detection.confidence,
        detection.is_fallback()
    );

    let crop = detect::rectify_document_rgb(&img, &detection.quad)?;
    crop.save(&output)?;
    println!("rectified crop written to {output}");

    Ok(())
}
