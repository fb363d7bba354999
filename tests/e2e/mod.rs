mod docker_tests;
