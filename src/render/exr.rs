use crate::core;
use crate::render::film;

use std::fs::File;
use std::io;
use std::io::Write;
use std::path::Path;
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use rayon::prelude::*;

/// A minimal OpenEXR 2.0 scanline encoder: three full-float channels in the
/// conventional B, G, R order, no compression, increasing-y line order.
/// Writing byte-by-byte here keeps the renderer independent of the OpenEXR
/// libraries; any EXR viewer can open the result.

const MAGIC_NUMBER: i32 = 20000630;
const VERSION: i32 = 2;
const PIXEL_TYPE_FLOAT: i32 = 2;
const COMPRESSION_NONE: u8 = 0;
const LINE_ORDER_INCREASING_Y: u8 = 0;

/// Writes the film's running image to an EXR file, replacing any previous
/// contents, so the file can be refreshed after every iteration.
pub fn write_exr<P: AsRef<Path>>(img: &film::Film, path: P) -> io::Result<()> {
    let mut buffer: Vec<u8> = Vec::new();

    buffer.write_i32::<LittleEndian>(MAGIC_NUMBER)?;
    buffer.write_i32::<LittleEndian>(VERSION)?;
    write_channels_attr(&mut buffer)?;
    write_compression_attr(&mut buffer)?;
    write_window_attrs(&mut buffer, img.width, img.height)?;
    write_line_order_attr(&mut buffer)?;
    write_pixel_aspect_ratio_attr(&mut buffer)?;
    write_screen_window_attrs(&mut buffer, img.width)?;
    buffer.push(0); // End of header.

    write_line_offset_table(&mut buffer, img)?;
    write_scanlines(&mut buffer, img);

    let mut file = File::create(path)?;
    file.write_all(&buffer)
}

fn write_str(buffer: &mut Vec<u8>, s: &str) {
    buffer.extend_from_slice(s.as_bytes());
    buffer.push(0);
}

fn write_channels_attr(buffer: &mut Vec<u8>) -> io::Result<()> {
    write_str(buffer, "channels");
    write_str(buffer, "chlist");

    let size: i32 =
        2 * 3 +  // Three channel names with a null terminator each.
        16 * 3 + // Four ints (16 bytes) of data per channel.
        1;       // One extra null byte closing the list.
    buffer.write_i32::<LittleEndian>(size)?;

    for channel in ["B", "G", "R"].iter() {
        write_str(buffer, channel);
        buffer.write_i32::<LittleEndian>(PIXEL_TYPE_FLOAT)?;
        buffer.write_i32::<LittleEndian>(0)?; // pLinear and reserved.
        buffer.write_i32::<LittleEndian>(1)?; // xSampling.
        buffer.write_i32::<LittleEndian>(1)?; // ySampling.
    }
    buffer.push(0);
    Ok(())
}

fn write_compression_attr(buffer: &mut Vec<u8>) -> io::Result<()> {
    write_str(buffer, "compression");
    write_str(buffer, "compression");
    buffer.write_i32::<LittleEndian>(1)?;
    buffer.push(COMPRESSION_NONE);
    Ok(())
}

fn write_window_attrs(buffer: &mut Vec<u8>, width: usize, height: usize)
    -> io::Result<()>
{
    let window = [0, 0, width as i32 - 1, height as i32 - 1];
    for attr in ["dataWindow", "displayWindow"].iter() {
        write_str(buffer, attr);
        write_str(buffer, "box2i");
        buffer.write_i32::<LittleEndian>(4 * 4)?;
        for &edge in window.iter() {
            buffer.write_i32::<LittleEndian>(edge)?;
        }
    }
    Ok(())
}

fn write_line_order_attr(buffer: &mut Vec<u8>) -> io::Result<()> {
    write_str(buffer, "lineOrder");
    write_str(buffer, "lineOrder");
    buffer.write_i32::<LittleEndian>(1)?;
    buffer.push(LINE_ORDER_INCREASING_Y);
    Ok(())
}

fn write_pixel_aspect_ratio_attr(buffer: &mut Vec<u8>) -> io::Result<()> {
    write_str(buffer, "pixelAspectRatio");
    write_str(buffer, "float");
    buffer.write_i32::<LittleEndian>(4)?;
    buffer.write_f32::<LittleEndian>(1.0)?;
    Ok(())
}

fn write_screen_window_attrs(buffer: &mut Vec<u8>, width: usize)
    -> io::Result<()>
{
    write_str(buffer, "screenWindowCenter");
    write_str(buffer, "v2f");
    buffer.write_i32::<LittleEndian>(8)?;
    buffer.write_f32::<LittleEndian>(0.0)?;
    buffer.write_f32::<LittleEndian>(0.0)?;

    write_str(buffer, "screenWindowWidth");
    write_str(buffer, "float");
    buffer.write_i32::<LittleEndian>(4)?;
    buffer.write_f32::<LittleEndian>(width as f32)?;
    Ok(())
}

/// Bytes per encoded scanline: the line number (int), the byte count
/// (unsigned int), then three floats per pixel.
fn line_size(img: &film::Film) -> usize {
    4 + 4 + img.width * 4 * 3
}

fn write_line_offset_table(buffer: &mut Vec<u8>, img: &film::Film)
    -> io::Result<()>
{
    let table_size = 8 * img.height; // One unsigned long per line.
    let data_offset = buffer.len() + table_size;

    for y in 0..img.height {
        let line_offset = data_offset + y * line_size(img);
        buffer.write_u64::<LittleEndian>(line_offset as u64)?;
    }
    Ok(())
}

fn write_scanlines(buffer: &mut Vec<u8>, img: &film::Film) {
    let line_size = line_size(img);
    let data_offset = buffer.len();
    buffer.resize(data_offset + img.height * line_size, 0);

    let data = &mut buffer[data_offset..];
    data.par_chunks_mut(line_size).enumerate().for_each(|(y, line)| {
        LittleEndian::write_i32(&mut line[0..4], y as i32);
        LittleEndian::write_u32(&mut line[4..8], line_size as u32 - 8);

        let first_pixel = core::index(y, 0, img.width);
        for i in 0..img.width {
            let pixel = &img.pixels()[first_pixel + i];
            let value = pixel.accum / pixel.weight;

            // Planar B, then G, then R within the line.
            let b = 8 + (0 * img.width + i) * 4;
            let g = 8 + (1 * img.width + i) * 4;
            let r = 8 + (2 * img.width + i) * 4;
            LittleEndian::write_f32(&mut line[b..(b + 4)], value.z);
            LittleEndian::write_f32(&mut line[g..(g + 4)], value.y);
            LittleEndian::write_f32(&mut line[r..(r + 4)], value.x);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::env;
    use std::fs;

    #[test]
    fn written_file_has_exr_magic_and_expected_size() {
        let mut img = film::Film::new(4, 2, 1, film::DEFAULT_FILTER_WIDTH);
        for y in 0..2 {
            for x in 0..4 {
                img.set_sample(
                    x, y, x as f32, y as f32, 0,
                    core::Vec::new(0.5, 0.25, 0.125));
            }
        }
        img.commit_samples();

        let path = env::temp_dir().join("deltaray_exr_writer_test.exr");
        write_exr(&img, &path).expect("write must succeed");

        let bytes = fs::read(&path).expect("file must exist");
        fs::remove_file(&path).ok();

        assert_eq!(LittleEndian::read_i32(&bytes[0..4]), MAGIC_NUMBER);
        assert_eq!(LittleEndian::read_i32(&bytes[4..8]), VERSION);
        // The data section holds two scanlines of 4 RGB float pixels each.
        let line = 4 + 4 + 4 * 4 * 3;
        assert!(bytes.len() > 2 * line);
    }
}
