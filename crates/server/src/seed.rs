//! Sample content for a fresh installation. Each step leaves existing data
//! alone, so seeding twice is harmless.

use std::fmt;

use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::types::Json;

use crate::about::db as about_db;
use crate::about::entries::{EducationEntry, ExperienceEntry};
use crate::about::models::SocialLinks;
use crate::auth::accounts::ensure_admin;
use crate::config::AdminCredentials;
use crate::media::MediaAsset;
use crate::project::db::insert_project;
use crate::project::models::{ProjectCategory, ProjectRecord, ProjectStatus};
use crate::skill::db::insert_skill;
use crate::skill::models::{SkillCategory, SkillPatch, SkillRecord};
use crate::validation::slug::base_slug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeedStep {
    Created,
    Skipped,
    /// No admin credentials were configured.
    NotConfigured,
}

impl fmt::Display for SeedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SeedStep::Created => "created",
            SeedStep::Skipped => "already present",
            SeedStep::NotConfigured => "skipped (no admin credentials)",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedReport {
    pub admin: SeedStep,
    pub about: SeedStep,
    pub skills: SeedStep,
    pub projects: SeedStep,
}

pub async fn seed_all(pool: &SqlitePool, admin: Option<&AdminCredentials>) -> Result<SeedReport> {
    let admin = match admin {
        Some(creds) if ensure_admin(pool, creds).await? => SeedStep::Created,
        Some(_) => SeedStep::Skipped,
        None => SeedStep::NotConfigured,
    };
    let report = SeedReport {
        admin,
        about: seed_about(pool).await?,
        skills: seed_skills(pool).await?,
        projects: seed_projects(pool).await?,
    };
    tracing::info!(?report, "seeding finished");
    Ok(report)
}

pub async fn seed_about(pool: &SqlitePool) -> Result<SeedStep> {
    if about_db::fetch_about(pool).await?.is_some() {
        return Ok(SeedStep::Skipped);
    }

    let mut about = about_db::get_or_create_default(pool).await?;
    about.name = "John Doe".to_string();
    about.subtitle = Some("MERN Stack Specialist".to_string());
    about.bio = "I'm a passionate Full Stack Developer with expertise in building modern web \
                 applications. I love creating clean, efficient and user-friendly solutions."
        .to_string();
    about.short_bio =
        Some("Building digital experiences with modern web technologies.".to_string());
    about.email = "hello@example.com".to_string();
    about.location = Some("Your City, Country".to_string());
    about.social_links = Json(SocialLinks {
        github: Some("https://github.com/yourusername".to_string()),
        linkedin: Some("https://linkedin.com/in/yourusername".to_string()),
        twitter: Some("https://twitter.com/yourusername".to_string()),
        ..Default::default()
    });
    about.years_of_experience = Some(3);
    about.projects_completed = Some(25);
    about.happy_clients = Some(15);
    about.experience = Json(vec![ExperienceEntry {
        id: cuid2::create_id(),
        company: Some("Tech Company".to_string()),
        position: Some("Full Stack Developer".to_string()),
        duration: Some("2022 - Present".to_string()),
        description: Some("Building and maintaining web applications.".to_string()),
        current: true,
    }]);
    about.education = Json(vec![EducationEntry {
        id: cuid2::create_id(),
        institution: Some("University Name".to_string()),
        degree: Some("Bachelor of Science".to_string()),
        field: Some("Computer Science".to_string()),
        duration: Some("2018 - 2022".to_string()),
        description: Some("Focused on software development and web technologies.".to_string()),
    }]);
    about.seo_title = Some("John Doe - Full Stack Developer Portfolio".to_string());
    about.seo_description = Some(
        "Professional portfolio of John Doe, a Full Stack Developer.".to_string(),
    );
    about.seo_keywords = Json(
        ["full stack developer", "mern stack", "react developer", "node.js developer"]
            .map(str::to_string)
            .to_vec(),
    );
    about.updated_at = Utc::now();

    about_db::save_about(pool, &about).await?;
    Ok(SeedStep::Created)
}

/// `(name, category, proficiency, icon, color, order)`
const SAMPLE_SKILLS: &[(&str, SkillCategory, i64, &str, &str, i64)] = &[
    ("React.js", SkillCategory::Frontend, 90, "fab fa-react", "#61DAFB", 1),
    ("JavaScript", SkillCategory::Frontend, 85, "fab fa-js", "#F7DF1E", 2),
    ("TypeScript", SkillCategory::Frontend, 75, "fab fa-js", "#3178C6", 3),
    ("HTML5", SkillCategory::Frontend, 95, "fab fa-html5", "#E34F26", 4),
    ("CSS3", SkillCategory::Frontend, 90, "fab fa-css3-alt", "#1572B6", 5),
    ("Tailwind CSS", SkillCategory::Frontend, 85, "fab fa-css3", "#06B6D4", 6),
    ("Node.js", SkillCategory::Backend, 85, "fab fa-node-js", "#339933", 1),
    ("Express.js", SkillCategory::Backend, 85, "fab fa-node", "#000000", 2),
    ("Python", SkillCategory::Backend, 70, "fab fa-python", "#3776AB", 3),
    ("MongoDB", SkillCategory::Database, 85, "fas fa-database", "#47A248", 1),
    ("PostgreSQL", SkillCategory::Database, 70, "fas fa-database", "#336791", 2),
    ("MySQL", SkillCategory::Database, 75, "fas fa-database", "#4479A1", 3),
    ("Git", SkillCategory::Devops, 85, "fab fa-git-alt", "#F05032", 1),
    ("Docker", SkillCategory::Devops, 65, "fab fa-docker", "#2496ED", 2),
    ("AWS", SkillCategory::Devops, 60, "fab fa-aws", "#232F3E", 3),
    ("VS Code", SkillCategory::Tools, 90, "fas fa-code", "#007ACC", 1),
    ("Postman", SkillCategory::Tools, 85, "fas fa-paper-plane", "#FF6C37", 2),
    ("Figma", SkillCategory::Tools, 70, "fab fa-figma", "#F24E1E", 3),
];

pub async fn seed_skills(pool: &SqlitePool) -> Result<SeedStep> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM skills")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        return Ok(SeedStep::Skipped);
    }

    for &(name, category, proficiency, icon, color, order) in SAMPLE_SKILLS {
        let patch = SkillPatch {
            name: Some(name.to_string()),
            category: Some(category),
            proficiency: Some(proficiency),
            icon: Some(Some(icon.to_string())),
            color: Some(color.to_string()),
            order: Some(order),
            is_visible: Some(true),
        };
        if let Some(skill) = SkillRecord::from_patch(patch) {
            insert_skill(pool, &skill).await?;
        }
    }
    Ok(SeedStep::Created)
}

struct SampleProject {
    title: &'static str,
    description: &'static str,
    long_description: Option<&'static str>,
    thumbnail: &'static str,
    technologies: &'static [&'static str],
    category: ProjectCategory,
    live_url: Option<&'static str>,
    github_url: &'static str,
    featured: bool,
}

const SAMPLE_PROJECTS: &[SampleProject] = &[
    SampleProject {
        title: "E-Commerce Platform",
        description: "A full-featured e-commerce platform with user authentication, product \
                      management, cart functionality, and payment integration.",
        long_description: Some(
            "Includes a product catalog, shopping cart, checkout with Stripe, order \
             management and an admin dashboard.",
        ),
        thumbnail: "https://via.placeholder.com/800x600/667eea/ffffff?text=E-Commerce",
        technologies: &["React", "Node.js", "MongoDB", "Express", "Redux", "Stripe"],
        category: ProjectCategory::Web,
        live_url: Some("https://example.com"),
        github_url: "https://github.com/example/ecommerce",
        featured: true,
    },
    SampleProject {
        title: "Task Management App",
        description: "A collaborative task management application with real-time updates, \
                      team workspaces, and progress tracking.",
        long_description: Some(
            "Drag-and-drop boards, real-time collaboration over Socket.io, team workspaces \
             and progress analytics.",
        ),
        thumbnail: "https://via.placeholder.com/800x600/764ba2/ffffff?text=Task+Manager",
        technologies: &["React", "Node.js", "Socket.io", "MongoDB", "Tailwind CSS"],
        category: ProjectCategory::Web,
        live_url: Some("https://example.com"),
        github_url: "https://github.com/example/taskmanager",
        featured: true,
    },
    SampleProject {
        title: "Weather Dashboard",
        description: "A weather dashboard app with location-based forecasts, interactive maps, \
                      and weather alerts.",
        long_description: None,
        thumbnail: "https://via.placeholder.com/800x600/11998e/ffffff?text=Weather+App",
        technologies: &["React", "OpenWeather API", "Chart.js", "Geolocation"],
        category: ProjectCategory::Web,
        live_url: Some("https://example.com"),
        github_url: "https://github.com/example/weather",
        featured: false,
    },
    SampleProject {
        title: "REST API Boilerplate",
        description: "A production-ready Node.js REST API boilerplate with authentication, \
                      validation, and best practices.",
        long_description: None,
        thumbnail: "https://via.placeholder.com/800x600/38ef7d/ffffff?text=API+Boilerplate",
        technologies: &["Node.js", "Express", "MongoDB", "JWT", "Jest"],
        category: ProjectCategory::Api,
        live_url: None,
        github_url: "https://github.com/example/api-boilerplate",
        featured: true,
    },
];

pub async fn seed_projects(pool: &SqlitePool) -> Result<SeedStep> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        return Ok(SeedStep::Skipped);
    }

    for (index, sample) in SAMPLE_PROJECTS.iter().enumerate() {
        let mut project = ProjectRecord::draft(MediaAsset {
            public_id: String::new(),
            url: sample.thumbnail.to_string(),
        });
        project.title = sample.title.to_string();
        project.description = sample.description.to_string();
        project.long_description = sample.long_description.map(str::to_string);
        project.technologies = Json(sample.technologies.iter().map(|t| t.to_string()).collect());
        project.category = sample.category;
        project.live_url = sample.live_url.map(str::to_string);
        project.github_url = Some(sample.github_url.to_string());
        project.featured = sample.featured;
        project.status = ProjectStatus::Completed;
        project.order_index = index as i64 + 1;

        insert_project(pool, &project, base_slug(sample.title)).await?;
    }
    Ok(SeedStep::Created)
}
