use super::assembler::ReportAssembler;
use super::quarters::QuartersReport;
use super::writer::{ReportKind, ReportWriter, item_file, person_file, report_file, summary_file, top_file};
use crate::Result;
use crate::filters::{Dimension, DimensionFilter, MetricFilters};
use crate::metrics::{DataSource, ItemCatalogue};
use camino::Utf8PathBuf;

const LOG_TARGET: &str = "  generate";

/// Write every report file of one data source, returning the paths written.
///
/// The unfiltered evolutionary, static and top reports come first. Each requested
/// dimension then gets one pair of files per catalogue item and a summary; a dimension
/// that fails is logged and skipped without touching the others. Finally, every person
/// ranked in the top report gets its own pair of files.
///
/// Code review also gets its quarterly people and organization rankings, skipped
/// with a warning when they cannot be computed.
pub fn generate(
    assembler: &ReportAssembler<'_>,
    writer: &ReportWriter,
    base: &MetricFilters,
    dimensions: &[Dimension],
) -> Result<Vec<Utf8PathBuf>> {
    let data_source = assembler.registry().data_source();
    let filters = assembler.bind(base)?.with_dimension(None);
    let mut written = Vec::new();

    log::info!(target: LOG_TARGET, "Generating {data_source} reports for {}", filters.range());

    let evolutionary = assembler.evolutionary(&filters, None)?;
    written.push(writer.write(&report_file(data_source, ReportKind::Evolutionary), &evolutionary.to_json())?);

    let aggregate = assembler.aggregate(&filters, None)?;
    written.push(writer.write(&report_file(data_source, ReportKind::Static), &aggregate.to_json())?);

    let top = assembler.top(&filters)?;
    written.push(writer.write(&top_file(data_source), &top.to_json())?);

    if data_source == DataSource::Scr {
        match QuartersReport::build(assembler.context(), &filters) {
            Ok(quarters) => {
                for (file_name, data) in quarters.files(data_source) {
                    written.push(writer.write(&file_name, &data)?);
                }
            }
            Err(err) => log::warn!(target: LOG_TARGET, "Skipping the quarterly reports of {data_source}: {err}"),
        }
    }

    for &dimension in dimensions {
        if dimension == Dimension::People {
            continue;
        }
        if !assembler.registry().supports(dimension) {
            log::debug!(target: LOG_TARGET, "{data_source} has no {dimension} reports");
            continue;
        }

        match dimension_reports(assembler, writer, &filters, dimension) {
            Ok(paths) => written.extend(paths),
            Err(err) => log::warn!(target: LOG_TARGET, "Skipping {dimension} reports of {data_source}: {err}"),
        }
    }

    let profile = assembler.registry().profile();
    if assembler.registry().supports(Dimension::People) && !profile.person_metrics.is_empty() {
        for id in top.people() {
            let (evolutionary, aggregate) = assembler.person(&filters, &id)?;
            written.push(writer.write(&person_file(&id, data_source, ReportKind::Evolutionary), &evolutionary.to_json())?);
            written.push(writer.write(&person_file(&id, data_source, ReportKind::Static), &aggregate.to_json())?);
        }
    }

    log::info!(target: LOG_TARGET, "Wrote {} {data_source} report files", written.len());
    Ok(written)
}

fn dimension_reports(
    assembler: &ReportAssembler<'_>,
    writer: &ReportWriter,
    filters: &MetricFilters,
    dimension: Dimension,
) -> Result<Vec<Utf8PathBuf>> {
    let data_source = assembler.registry().data_source();
    let catalogue = catalogue(assembler, filters, dimension)?;
    let mut written = Vec::with_capacity(catalogue.len() * 2 + 1);

    for item in catalogue.items() {
        let scoped = filters.with_dimension(Some(DimensionFilter::scoped(dimension, item.as_str())));

        let evolutionary = assembler.evolutionary(&scoped, None)?;
        written.push(writer.write(&item_file(item, data_source, dimension, ReportKind::Evolutionary), &evolutionary.to_json())?);

        let aggregate = assembler.aggregate(&scoped, None)?;
        written.push(writer.write(&item_file(item, data_source, dimension, ReportKind::Static), &aggregate.to_json())?);
    }

    let summary = assembler.summary(filters, &catalogue)?;
    written.push(writer.write(&summary_file(data_source, dimension), &summary.to_json())?);
    Ok(written)
}

fn catalogue(assembler: &ReportAssembler<'_>, filters: &MetricFilters, dimension: Dimension) -> Result<ItemCatalogue> {
    Ok(assembler.registry().catalogue(assembler.context(), filters, dimension)?)
}
