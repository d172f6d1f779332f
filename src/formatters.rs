use crate::models::{Hospital, SurgeForecast};

/// Formats a surge forecast into a human-readable string
pub fn format_surge_forecast(forecast: &SurgeForecast) -> String {
    let mut output = format!(
        "Surge Forecast ({}h horizon)\nPrimary surge type: {}\nPrimary severity: {}\n\n",
        forecast.horizon_hours, forecast.primary_surge_type, forecast.primary_surge_severity
    );

    for bucket in &forecast.time_buckets {
        output.push_str(&format!(
            "{}:\n  Predicted patient load: {:.2}\n  Predicted disease spike: {}\n  Air quality: {}\n\n",
            bucket.date,
            bucket.predicted_patient_load,
            bucket.predicted_disease_spike,
            bucket.predicted_intensity
        ));
    }
    output
}

/// Formats a hospital listing for one pincode into a human-readable string
pub fn format_hospitals(pincode: &str, hospitals: &[Hospital]) -> String {
    if hospitals.is_empty() {
        return format!("No hospitals registered for pincode {}.", pincode);
    }

    let mut output = format!("Hospitals in pincode {}:\n\n", pincode);
    for (i, hospital) in hospitals.iter().enumerate() {
        output.push_str(&format!(
            "Hospital {}:\n  Name: {} ({})\n  City: {}\n  Specialty: {}\n  Beds: {} total, {} ICU\n  Ventilators: {}\n  Staff: {} doctors, {} nurses\n  Inventory: {} oxygen cylinders, {} PPE kits\n  Emergency available: {}\n  Rating: {:.1}\n  Contact: {}\n  Last updated: {}\n\n",
            i + 1,
            hospital.hospital_name,
            hospital.hospital_id,
            hospital.city,
            hospital.specialty,
            hospital.total_beds,
            hospital.icu_beds,
            hospital.ventilators,
            hospital.doctors_available,
            hospital.nurses_available,
            hospital.oxygen_cylinders,
            hospital.ppe_kits,
            hospital.emergency_available,
            hospital.rating,
            hospital.contact_number,
            hospital.last_updated
        ));
    }
    output
}
