use crate::infra::{build_services, system_principal, Applications, Catalog};
use admissions::applications::{ApplicationStatus, ApplicationSubmission, StatusChangeRequest};
use admissions::catalog::{
    CatalogImporter, EligibilityOption, EligibilityQuery, ImportReport, University,
};
use admissions::error::{AdmissionError, AppError};
use admissions::persistence::InMemoryStore;
use admissions::principal::Principal;
use clap::Args;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

const DEMO_CATALOG: &str = "\
university_code,university_name,major_code,major_name,admission_method_code,admission_method_name,subject_group_code,subject_group_name,subjects,year,min_score
NU,National University,CS,Computer Science,THPT,National graduation exam,A00,Science,Maths;Physics;Chemistry,2025,24
NU,National University,CS,Computer Science,THPT,National graduation exam,A01,Science and English,Maths;Physics;English,2025,24.5
NU,National University,CS,Computer Science,HB,Transcript review,A00,Science,Maths;Physics;Chemistry,2025,
NU,National University,EE,Electrical Engineering,THPT,National graduation exam,A00,Science,Maths;Physics;Chemistry,2025,22
";

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Catalog CSV to use instead of the built-in sample
    #[arg(long)]
    pub(crate) seed: Option<PathBuf>,
    /// Academic year used for the eligibility lookup and the submission
    #[arg(long, default_value_t = 2025)]
    pub(crate) year: i64,
    /// Candidate identifier used for the submission
    #[arg(long, default_value = "cand-demo")]
    pub(crate) candidate: String,
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// Catalog CSV export to validate
    pub(crate) path: PathBuf,
    /// Print the report as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

/// Load the CSV into a throwaway store so the report reflects what a real import would do.
pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let (catalog, _) = build_services(Arc::new(InMemoryStore::new()));
    let report = CatalogImporter::from_path(&catalog, &system_principal(), &args.path)?;

    if args.json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
        println!("{rendered}");
    } else {
        print_report(&args.path.display().to_string(), &report);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let (catalog, applications) = build_services(Arc::new(InMemoryStore::new()));
    let admin = system_principal();

    let report = match &args.seed {
        Some(path) => CatalogImporter::from_path(&catalog, &admin, path)?,
        None => CatalogImporter::from_reader(&catalog, &admin, Cursor::new(DEMO_CATALOG))?,
    };
    println!("Admissions demo");
    print_report("catalog", &report);

    if let Err(err) = walkthrough(&catalog, &applications, &args) {
        println!("\nDemo stopped: {err}");
    }
    Ok(())
}

fn walkthrough(
    catalog: &Catalog,
    applications: &Applications,
    args: &DemoArgs,
) -> Result<(), AdmissionError> {
    let admin = system_principal();
    let candidate = Principal::candidate(args.candidate.clone());

    let university = first_university(catalog)?;
    let majors = catalog.majors_for_university(&university.id)?;
    let Some(major) = majors.first() else {
        println!("\n{} offers no active majors", university.name);
        return Ok(());
    };

    let query = EligibilityQuery::new(major.id, args.year)?;
    let options = catalog.eligibility().resolve(&query)?;
    println!(
        "\nEligibility for {} / {} in {}:",
        university.name, major.name, query.year
    );
    if options.is_empty() {
        println!("  no admission combinations published");
        return Ok(());
    }
    for option in &options {
        print_option(option);
    }

    let chosen = &options[0];
    let submission = ApplicationSubmission {
        university_id: university.id,
        major_id: major.id,
        admission_method_id: chosen.admission_method.id,
        subject_group_id: chosen.subject_group.id,
        year: query.year,
        documents: Vec::new(),
    };

    let application = applications.submit(&candidate, submission.clone())?;
    println!(
        "\nSubmitted application {} ({}, version {})",
        application.id, application.status, application.version
    );

    match applications.submit(&candidate, submission.clone()) {
        Err(err) => println!("  Second submission refused: {err}"),
        Ok(duplicate) => println!("  Unexpected second application {}", duplicate.id),
    }

    let approved = applications.transition(
        &admin,
        &application.id,
        StatusChangeRequest {
            status: ApplicationStatus::Approved,
            expected_version: Some(application.version),
            note: Some("Scores verified against the exam registry".to_string()),
        },
    )?;
    println!("  Decision: {} (version {})", approved.status, approved.version);

    if let Err(err) = applications.transition(
        &admin,
        &application.id,
        StatusChangeRequest::to(ApplicationStatus::Processing),
    ) {
        println!("  Reopening refused: {err}");
    }

    println!("\nAudit trail:");
    for change in applications.history(&candidate, &application.id)? {
        println!(
            "  {}  {} -> {}  by {}{}",
            change.at.format("%Y-%m-%d %H:%M:%S"),
            change.from,
            change.to,
            change.actor,
            change
                .note
                .map(|note| format!("  ({note})"))
                .unwrap_or_default()
        );
    }

    match applications.submit(&candidate, submission) {
        Err(err) => println!("\nResubmission after approval refused: {err}"),
        Ok(extra) => println!("\nUnexpected resubmission {}", extra.id),
    }
    Ok(())
}

fn first_university(catalog: &Catalog) -> Result<University, AdmissionError> {
    catalog
        .universities(true)?
        .into_iter()
        .min_by(|left, right| left.code.cmp(&right.code))
        .ok_or_else(|| AdmissionError::not_found("university", "in imported catalog"))
}

fn print_option(option: &EligibilityOption) {
    let score = option
        .min_score
        .map(|score| format!("{score:.2}"))
        .unwrap_or_else(|| "n/a".to_string());
    println!(
        "  {:<6} {:<32} {:<5} [{}]  min score {}",
        option.admission_method.code,
        option.admission_method.name,
        option.subject_group.code,
        option.subject_group.subjects.join(", "),
        score
    );
}

fn print_report(source: &str, report: &ImportReport) {
    println!(
        "Imported {source}: {} rows, {} mappings created, {} already present, {} rejected",
        report.rows,
        report.created_entries,
        report.skipped_entries,
        report.failures.len()
    );
    for failure in &report.failures {
        println!("  line {}: {}", failure.line, failure.message);
    }
}
