#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightEntry {
    pub label: String,
    pub description: String,
    pub suggestions: Vec<String>,
}

struct CatalogEntry {
    label: &'static str,
    description: &'static str,
    suggestions: [&'static str; 3],
}

const CATALOG: [CatalogEntry; 3] = [
    CatalogEntry {
        label: "Fast Learner",
        description: "Kamu cepat memahami konsep baru dan belajar dengan efisien.",
        suggestions: [
            "Ambil modul lanjutan untuk menjaga tantangan belajar.",
            "Kerjakan proyek mandiri untuk memperdalam pemahaman.",
            "Bantu teman belajar agar pemahamanmu makin kuat.",
        ],
    },
    CatalogEntry {
        label: "Reflective",
        description: "Kamu belajar dengan stabil dan mendalam sesuai estimasi modul.",
        suggestions: [
            "Buat catatan ringkas setelah setiap modul.",
            "Sisihkan waktu untuk meninjau ulang materi sebelumnya.",
            "Diskusikan materi di forum untuk memperluas sudut pandang.",
        ],
    },
    CatalogEntry {
        label: "Consistent",
        description: "Kamu belajar secara konsisten meski membutuhkan waktu lebih lama.",
        suggestions: [
            "Pertahankan jadwal belajar rutin setiap hari.",
            "Pecah modul besar menjadi target harian yang kecil.",
            "Gunakan latihan soal untuk mempercepat pemahaman.",
        ],
    },
];

pub fn known_labels() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|entry| entry.label)
}

/// Never fails: unknown labels get an empty description and no suggestions.
pub fn lookup(label: &str) -> InsightEntry {
    match CATALOG.iter().find(|entry| entry.label == label) {
        Some(entry) => InsightEntry {
            label: entry.label.to_string(),
            description: entry.description.to_string(),
            suggestions: entry.suggestions.iter().map(|s| s.to_string()).collect(),
        },
        None => InsightEntry {
            label: label.to_string(),
            description: String::new(),
            suggestions: Vec::new(),
        },
    }
}
