use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use log::debug;

use crate::{
    colors::render_simulation, simulation_parameters::SimulationParams, Canvas, FluidSimulation,
    SimulationVisualizer, VisualizationParams,
};

/// Writes every presented frame as `<dir>/frame-000000.png`, one pixel per
/// grid cell.
pub struct PngSequenceWriter {
    dir: PathBuf,
    canvas: Canvas,
    frames_written: usize,
}

impl PngSequenceWriter {
    pub fn new(dir: &Path, width: usize, height: usize) -> Result<Self, String> {
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("failed to create output directory {}: {}", dir.display(), e))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            canvas: Canvas::new(width, height),
            frames_written: 0,
        })
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    fn next_path(&self) -> PathBuf {
        self.dir.join(format!("frame-{:06}.png", self.frames_written))
    }
}

impl SimulationVisualizer for PngSequenceWriter {
    fn present(
        &mut self,
        fluid_simulation: &FluidSimulation,
        _simulation_params: &SimulationParams,
        visualization_params: VisualizationParams,
    ) -> Result<(), String> {
        render_simulation(fluid_simulation, visualization_params, &mut self.canvas).map_err(|e| e.to_string())?;

        let path = self.next_path();
        write_png(&path, &self.canvas)?;
        debug!("wrote {}", path.display());

        self.frames_written += 1;
        Ok(())
    }
}

pub fn write_png(path: &Path, canvas: &Canvas) -> Result<(), String> {
    let file = File::create(path).map_err(|e| format!("failed to create {}: {}", path.display(), e))?;

    let mut encoder = png::Encoder::new(BufWriter::new(file), canvas.width() as u32, canvas.height() as u32);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_source_gamma(png::ScaledFloat::new(1.0 / 2.2));
    let source_chromaticities = png::SourceChromaticities::new(
        (0.31270, 0.32900),
        (0.64000, 0.33000),
        (0.30000, 0.60000),
        (0.15000, 0.06000),
    );
    encoder.set_source_chromaticities(source_chromaticities);

    let mut writer = encoder
        .write_header()
        .map_err(|e| format!("failed to write png header of {}: {}", path.display(), e))?;
    writer
        .write_image_data(&canvas.to_rgba_bytes())
        .map_err(|e| format!("failed to write png data of {}: {}", path.display(), e))
}
