use es_flame_graph::commands::{execute_generate, validate_profile_file, GenerateArgs};
use es_flame_graph::flamegraph::{FlamegraphConfig, MinWidth};
use es_flame_graph::output::read_profile;
use es_flame_graph::parser::{detect_format, parse_input, InputFormat, TimeUnit};
use std::fs;
use std::path::Path;

const HOT_THREADS: &str = "::: {n1}{es-data-1}{e1}{10.0.0.1}{10.0.0.1:9300}
   Hot threads at 2026-01-18T08:42:32.186Z, interval=500ms, busiestThreads=3, ignoreIdleThreads=true:

   40.0% (200ms out of 500ms) cpu usage by thread 'elasticsearch[es-data-1][search][T#1]'
     10/10 snapshots sharing following 2 elements
       org.apache.lucene.search.IndexSearcher.search(IndexSearcher.java:445)
       java.base@17.0.2/java.lang.Thread.run(Thread.java:833)

   10.0% (50ms out of 500ms) cpu usage by thread 'elasticsearch[es-data-1][write][T#2]'
     4/10 snapshots sharing following 1 elements
       org.elasticsearch.action.bulk.TransportShardBulkAction.performOnPrimary(TransportShardBulkAction.java:200)

::: {n2}{es-data-2}{e2}{10.0.0.2}{10.0.0.2:9300}
   Hot threads at 2026-01-18T08:42:32.190Z, interval=500ms, busiestThreads=3, ignoreIdleThreads=true:

   20.0% (100ms out of 500ms) cpu usage by thread 'elasticsearch[es-data-2][search][T#1]'
     7/10 snapshots sharing following 1 elements
       org.apache.lucene.search.IndexSearcher.search(IndexSearcher.java:445)
";

const TASKS: &str = r#"{
  "nodes": {
    "n1": {
      "name": "es-data-1",
      "tasks": {
        "n1:10": {"action": "indices:data/read/search", "running_time_in_nanos": 5000000, "description": "indices[logs]"},
        "n1:11": {"action": "indices:data/read/search[phase/query]", "running_time_in_nanos": 3000000, "parent_task_id": "n1:10"},
        "n1:12": {"action": "indices:data/write/bulk", "running_time_in_nanos": "2000000"}
      }
    },
    "n2": {
      "name": "es-data-2",
      "tasks": {
        "n2:3": {"action": "indices:data/read/search[phase/query]", "running_time_in_nanos": 1000000, "parent_task_id": "n1:10"}
      }
    }
  }
}"#;

fn write_input(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_detect_formats() {
    assert_eq!(detect_format(HOT_THREADS).unwrap(), InputFormat::HotThreads);
    assert_eq!(detect_format(TASKS).unwrap(), InputFormat::Tasks);
    assert_eq!(
        detect_format(&format!("{}\n{}", HOT_THREADS, TASKS)).unwrap(),
        InputFormat::Mixed
    );
    assert!(detect_format("nothing to see here").is_err());
}

#[test]
fn test_tasks_fold_across_nodes() {
    let batches = parse_input(TASKS).unwrap();
    assert_eq!(batches.len(), 1);
    let batch = &batches[0];
    assert_eq!(batch.unit, TimeUnit::Nanos);
    assert_eq!(batch.records.len(), 4);
    assert_eq!(batch.total, 11_000_000.0);

    let table = es_flame_graph::aggregator::aggregate(&batch.records);
    let search = table.get("n1", "indices:data/read/search").unwrap();
    assert_eq!(search.cost, 9_000_000.0);
    assert_eq!(search.count, 3);
    assert_eq!(table.total_count(), 4);
}

#[test]
fn test_generate_hot_threads_svg_and_profile() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "hot.txt", HOT_THREADS);
    let output = dir.path().join("out/hot.svg");
    let json = dir.path().join("out/hot.json");

    let args = GenerateArgs {
        input,
        output: output.clone(),
        output_json: Some(json.clone()),
        ..Default::default()
    };
    let written = execute_generate(&args).unwrap();

    assert_eq!(written, vec![output.clone()]);
    let svg = fs::read_to_string(&output).unwrap();
    assert!(svg.contains("Elasticsearch Hot Threads"));
    assert!(svg.contains("elasticsearch[es-data-1][search][T#1] (200 ms, 80.00%)"));

    let profile = read_profile(&json).unwrap();
    assert_eq!(profile.input_format, InputFormat::HotThreads);
    assert_eq!(profile.unit, TimeUnit::Millis);
    assert_eq!(profile.total_cost, 350.0);
    assert_eq!(profile.node_count, 2);
    assert_eq!(profile.entries[0].cost, 200.0);
    assert!(validate_profile_file(&json).is_ok());
}

#[test]
fn test_generate_mixed_writes_one_svg_per_format() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        "dump.txt",
        &format!("{}\ntasks:\n{}", HOT_THREADS, TASKS),
    );
    let output = dir.path().join("graph.svg");

    let args = GenerateArgs {
        input,
        output,
        title: Some("Cluster <prod>".to_string()),
        ..Default::default()
    };
    let written = execute_generate(&args).unwrap();

    assert_eq!(
        written,
        vec![
            dir.path().join("graph_hot_threads.svg"),
            dir.path().join("graph_tasks.svg"),
        ]
    );
    let tasks_svg = fs::read_to_string(dir.path().join("graph_tasks.svg")).unwrap();
    assert!(tasks_svg.contains("Cluster &lt;prod&gt;"));
    assert!(tasks_svg.contains(" ns, "));
}

#[test]
fn test_generate_per_node_into_directory() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "hot.txt", HOT_THREADS);
    let out_dir = dir.path().join("nodes");
    fs::create_dir(&out_dir).unwrap();

    let args = GenerateArgs {
        input,
        output: out_dir.clone(),
        per_node: true,
        flamegraph_config: FlamegraphConfig::new().with_min_width(MinWidth::Percent(1.0)),
        ..Default::default()
    };
    let written = execute_generate(&args).unwrap();

    assert_eq!(written, vec![out_dir.join("n1.svg"), out_dir.join("n2.svg")]);
    let n2 = fs::read_to_string(out_dir.join("n2.svg")).unwrap();
    assert!(n2.contains("Elasticsearch Hot Threads - n2"));
    assert!(!n2.contains("es-data-1"));
}

#[test]
fn test_generate_rejects_unknown_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "junk.txt", "hello world");

    let args = GenerateArgs {
        input,
        output: dir.path().join("junk.svg"),
        ..Default::default()
    };
    assert!(execute_generate(&args).is_err());
}
