//! Tests for ms-output.

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;

    use crate::csv::CsvWriter;
    use crate::row::{MessageRow, SummaryRow, TrajectoryRow};
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn message_row(time: f64, kind: &'static str) -> MessageRow {
        MessageRow { time, channel: 0, kind, ready_at: time + 0.5, detail: String::new() }
    }

    #[test]
    fn csv_files_created() {
        let dir = tmp();
        let _w = CsvWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("messages.csv").exists());
        assert!(dir.path().join("trajectory.csv").exists());
        assert!(dir.path().join("summary.csv").exists());
    }

    #[test]
    fn csv_headers_correct() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        let headers = |name: &str| -> Vec<String> {
            let mut rdr = csv::Reader::from_path(dir.path().join(name)).unwrap();
            rdr.headers().unwrap().iter().map(str::to_owned).collect()
        };
        assert_eq!(headers("messages.csv"), ["time", "channel", "kind", "ready_at", "detail"]);
        assert_eq!(headers("trajectory.csv"), ["time", "north", "east", "down", "yaw", "state"]);
        assert_eq!(headers("summary.csv"), ["final_time", "messages", "resumes", "classified"]);
    }

    #[test]
    fn csv_message_round_trip() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        let mut feedback = message_row(247.0, "plan_feedback");
        feedback.channel = 1;
        feedback.detail = "TargetId(3) mine".to_owned();
        w.write_messages(&[message_row(0.0, "nav_request"), feedback]).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("messages.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][2], "nav_request");
        assert_eq!(&rows[0][3], "0.5");
        assert_eq!(&rows[1][0], "247");
        assert_eq!(&rows[1][1], "1");
        assert_eq!(&rows[1][4], "TargetId(3) mine");
    }

    #[test]
    fn csv_trajectory_is_rounded() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_trajectory(&[TrajectoryRow {
            time:  50.0,
            north: 38.400_000_01,
            east:  0.0,
            down:  -1.0 / 3.0,
            yaw:   std::f64::consts::FRAC_PI_2,
            state: "navigate".to_owned(),
        }])
        .unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("trajectory.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][1], "38.400");
        assert_eq!(&rows[0][3], "-0.333");
        assert_eq!(&rows[0][4], "1.5708");
        assert_eq!(&rows[0][5], "navigate");
    }

    #[test]
    fn csv_summary_round_trip() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_summary(&SummaryRow { final_time: 3600.0, messages: 42, resumes: 900, classified: 8 })
            .unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("summary.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "3600");
        assert_eq!(&rows[0][1], "42");
        assert_eq!(&rows[0][2], "900");
        assert_eq!(&rows[0][3], "8");
    }

    #[test]
    fn csv_finish_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }

    #[test]
    fn csv_empty_batch_ok() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_messages(&[]).unwrap();
        w.write_trajectory(&[]).unwrap();
    }

    #[test]
    fn csv_missing_dir_is_error() {
        let dir = tmp();
        assert!(CsvWriter::new(&dir.path().join("nope")).is_err());
    }
}

#[cfg(test)]
mod observer_tests {
    use std::io;

    use ms_core::{NedPoint, TargetId};
    use ms_mission::{MissionBuilder, MissionConfig, Target};
    use tempfile::TempDir;

    use crate::csv::CsvWriter;
    use crate::observer::MissionLogObserver;
    use crate::row::{MessageRow, SummaryRow, TrajectoryRow};
    use crate::writer::OutputWriter;
    use crate::{OutputError, OutputResult};

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn single_target_mission(duration: f64) -> ms_mission::Mission {
        let config = MissionConfig {
            linear_vel:    0.8,
            duration,
            sample_period: Some(10.0),
            ..MissionConfig::default()
        };
        MissionBuilder::new(config)
            .targets(vec![Target::new(TargetId(0), NedPoint::new(100.0, 0.0, 0.0))])
            .build()
            .unwrap()
    }

    #[test]
    fn integration_csv() {
        let mut mission = single_target_mission(300.0);
        let dir = tmp();
        let writer = CsvWriter::new(dir.path()).unwrap();
        let mut obs = MissionLogObserver::new(writer);
        mission.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none(), "no write errors expected");

        let summary = obs.finish(&mission).unwrap();
        assert_eq!(summary.final_time, 300.0);
        assert_eq!(summary.classified, 1);
        assert!(summary.resumes > summary.messages);

        let mut rdr = csv::Reader::from_path(dir.path().join("messages.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len() as u64, summary.messages);
        assert_eq!(&rows[0][2], "nav_request");
        let feedback: Vec<_> = rows.iter().filter(|r| &r[2] == "plan_feedback").collect();
        assert_eq!(feedback.len(), 1);
        let at: f64 = feedback[0][0].parse().unwrap();
        assert!((at - 247.0).abs() < 1e-6, "feedback at {at}");

        // Samples at 0, 10, ..., 300.
        let mut rdr = csv::Reader::from_path(dir.path().join("trajectory.csv")).unwrap();
        let traj: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(traj.len(), 31);
        assert_eq!(&traj[0][5], "idle");
        assert_eq!(&traj[5][1], "38.400");

        let mut rdr = csv::Reader::from_path(dir.path().join("summary.csv")).unwrap();
        let sums: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(sums.len(), 1);
        assert_eq!(&sums[0][3], "1");
    }

    #[test]
    fn observer_counts_match_run() {
        let mut mission = single_target_mission(50.0);
        let mut obs = MissionLogObserver::new(Recorder::default());
        mission.run(&mut obs).unwrap();
        let messages = obs.messages();
        let summary = obs.finish(&mission).unwrap();
        assert_eq!(summary.messages, messages);
        assert_eq!(summary.classified, 0);

        let rec = obs.into_writer();
        assert_eq!(rec.messages.len() as u64, messages);
        assert_eq!(rec.trajectory.len(), 6);
        assert_eq!(rec.summaries, vec![summary]);
        assert_eq!(rec.finished, 1);
    }

    #[test]
    fn write_error_is_stored_and_reported() {
        let mut mission = single_target_mission(20.0);
        let mut obs = MissionLogObserver::new(Failing);
        mission.run(&mut obs).unwrap();
        assert!(matches!(obs.take_error(), Some(OutputError::Io(_))));
        assert!(obs.take_error().is_none());
    }

    #[test]
    fn finish_reports_stored_error_first() {
        let mut mission = single_target_mission(20.0);
        let mut obs = MissionLogObserver::new(Failing);
        mission.run(&mut obs).unwrap();
        assert!(obs.finish(&mission).is_err());
    }

    #[derive(Default)]
    struct Recorder {
        messages:   Vec<MessageRow>,
        trajectory: Vec<TrajectoryRow>,
        summaries:  Vec<SummaryRow>,
        finished:   u32,
    }

    impl OutputWriter for Recorder {
        fn write_messages(&mut self, rows: &[MessageRow]) -> OutputResult<()> {
            self.messages.extend_from_slice(rows);
            Ok(())
        }
        fn write_trajectory(&mut self, rows: &[TrajectoryRow]) -> OutputResult<()> {
            self.trajectory.extend_from_slice(rows);
            Ok(())
        }
        fn write_summary(&mut self, row: &SummaryRow) -> OutputResult<()> {
            self.summaries.push(*row);
            Ok(())
        }
        fn finish(&mut self) -> OutputResult<()> {
            self.finished += 1;
            Ok(())
        }
    }

    struct Failing;

    impl OutputWriter for Failing {
        fn write_messages(&mut self, _: &[MessageRow]) -> OutputResult<()> {
            Err(OutputError::Io(io::Error::other("disk full")))
        }
        fn write_trajectory(&mut self, _: &[TrajectoryRow]) -> OutputResult<()> {
            Ok(())
        }
        fn write_summary(&mut self, _: &SummaryRow) -> OutputResult<()> {
            Ok(())
        }
        fn finish(&mut self) -> OutputResult<()> {
            Ok(())
        }
    }
}
